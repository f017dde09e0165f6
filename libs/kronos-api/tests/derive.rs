use chrono::NaiveDateTime;
use kronos_api::{Composite, NodeKind, Shape, Temporal, Walk};

#[derive(Temporal)]
struct Audit {
    #[time]
    created_at: NaiveDateTime,
    #[time]
    updated_at: Option<NaiveDateTime>,
    revision: u32,
}

#[derive(Temporal)]
struct Meeting {
    title: String,
    #[time(format = "yyyy/MM/dd HH:mm")]
    created_at: String,
    attendees: Vec<String>,
    #[time(skip)]
    #[allow(dead_code)]
    secret: std::cell::Cell<u8>,
    #[time(base)]
    audit: Audit,
}

#[derive(Temporal)]
struct Window(#[time] NaiveDateTime, NaiveDateTime);

#[derive(Temporal)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Temporal)]
#[allow(dead_code)]
enum Status {
    Open,
    Closed,
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn meeting() -> Meeting {
    Meeting {
        title: "standup".into(),
        created_at: "2025/05/20 10:00".into(),
        attendees: vec!["ann".into()],
        secret: std::cell::Cell::new(7),
        audit: Audit {
            created_at: at("2025-05-01 00:00:00"),
            updated_at: None,
            revision: 3,
        },
    }
}

#[test]
fn describe_lists_own_fields_then_base_fields() {
    let m = meeting();
    let fields = m.describe();
    let names: Vec<_> = fields.iter().map(|f| f.name).collect();
    assert_eq!(names, ["title", "created_at", "attendees", "updated_at", "revision"]);

    // Own `created_at` shadows the base one.
    let created = &fields[1];
    assert!(created.has_marker);
    assert_eq!(created.marker_format, Some("yyyy/MM/dd HH:mm"));
    assert_eq!(created.declared_type, "String");

    assert_eq!(fields[3].declared_type, "Option<NaiveDateTime>");
    assert!(fields[3].has_marker);
    assert_eq!(fields[3].marker_format, None);
    assert!(!fields[0].has_marker);
}

#[test]
fn field_access_reaches_base_fields() {
    let mut m = meeting();
    assert!(m.has_field("revision"));
    assert!(!m.has_field("secret"));
    assert!(!m.has_field("audit"));

    let revision = m.field_mut("revision").unwrap();
    *revision.as_any_mut().downcast_mut::<u32>().unwrap() = 4;
    assert_eq!(m.audit.revision, 4);

    let title = m.field_mut("title").unwrap();
    title.as_any_mut().downcast_mut::<String>().unwrap().push('!');
    assert_eq!(m.title, "standup!");

    assert!(m.field_mut("missing").is_none());
}

#[test]
fn derived_structs_are_composites() {
    let mut m = meeting();
    assert_eq!(m.kind(), NodeKind::Composite);
    assert!(matches!(m.shape(), Shape::Composite(_)));
}

#[test]
fn tuple_structs_use_positional_names() {
    let w = Window(at("2025-05-20 10:00:00"), at("2025-05-20 11:00:00"));
    let fields = w.describe();
    assert_eq!(fields.iter().map(|f| f.name).collect::<Vec<_>>(), ["0", "1"]);
    assert!(fields[0].has_marker);
    assert!(!fields[1].has_marker);
}

#[test]
fn generic_structs_derive() {
    let mut page = Page { items: vec![at("2025-05-20 10:00:00")] };
    assert!(page.has_field("items"));
    let items = page.field_mut("items").unwrap();
    assert_eq!(items.kind(), NodeKind::Sequence);
}

#[test]
fn enums_are_opaque() {
    let mut status = Status::Open;
    assert_eq!(status.kind(), NodeKind::Scalar);
    assert!(matches!(status.shape(), Shape::Scalar));
    let _ = Status::Closed;
}
