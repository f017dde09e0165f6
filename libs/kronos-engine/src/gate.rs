use std::future::Future;
use std::sync::Arc;

use kronos_api::Zone;
use kronos_api::walk::Walk;

use crate::config::KronosConfig;
use crate::converter::TimeZoneConverter;

/// Which sides of an invocation are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertPolicy {
    /// Arguments, client → backend.
    pub arguments: bool,
    /// Result, backend → client.
    pub result: bool,
}

impl ConvertPolicy {
    /// Read-only handlers: arguments in, result out.
    pub const QUERY: Self = Self { arguments: true, result: true };
    /// Mutating handlers: arguments only.
    pub const COMMAND: Self = Self { arguments: true, result: false };
    pub const NONE: Self = Self { arguments: false, result: false };
}

/// One argument of an invocation.
pub struct Argument<'a> {
    value: &'a mut dyn Walk,
    marked: bool,
    format: Option<&'a str>,
}

impl<'a> Argument<'a> {
    /// An argument that takes part in conversion.
    pub fn marked(value: &'a mut dyn Walk) -> Self {
        Self { value, marked: true, format: None }
    }

    /// An argument passed through untouched.
    pub fn unmarked(value: &'a mut dyn Walk) -> Self {
        Self { value, marked: false, format: None }
    }

    /// Pattern for textual values of this argument.
    pub fn with_format(mut self, format: &'a str) -> Self {
        self.format = Some(format);
        self
    }
}

/// Converts arguments before and results after a unit of work.
///
/// Honours the `enabled`, `handle_request` and `handle_response`
/// settings on top of the per-call [`ConvertPolicy`].
#[derive(Debug, Clone)]
pub struct InvocationGate {
    converter: Arc<TimeZoneConverter>,
    enabled: bool,
    handle_request: bool,
    handle_response: bool,
}

impl InvocationGate {
    pub fn new(converter: Arc<TimeZoneConverter>, config: &KronosConfig) -> Self {
        Self {
            converter,
            enabled: config.enabled,
            handle_request: config.handle_request,
            handle_response: config.handle_response,
        }
    }

    pub fn converter(&self) -> &Arc<TimeZoneConverter> {
        &self.converter
    }

    pub fn converts_arguments(&self, policy: ConvertPolicy) -> bool {
        self.enabled && self.handle_request && policy.arguments
    }

    pub fn converts_result(&self, policy: ConvertPolicy) -> bool {
        self.enabled && self.handle_response && policy.result
    }

    /// Convert every marked argument client → backend, in place.
    pub fn inbound(&self, client: &Zone, args: &mut [Argument<'_>]) {
        if !self.converts_arguments(ConvertPolicy::COMMAND) {
            return;
        }
        let backend = self.converter.backend_zone();
        for arg in args.iter_mut().filter(|a| a.marked) {
            self.converter.convert_in_place_with(arg.value, client, backend, arg.format);
        }
    }

    /// Convert a result backend → client.
    pub fn outbound<R: Walk>(&self, client: &Zone, result: R) -> R {
        if !self.converts_result(ConvertPolicy::QUERY) {
            return result;
        }
        self.converter.to_client(result, client)
    }

    /// Run `work` between argument and result conversion.
    pub fn around<A, R, F>(&self, client: &Zone, policy: ConvertPolicy, mut args: A, work: F) -> R
    where
        A: Walk,
        R: Walk,
        F: FnOnce(A) -> R,
    {
        if self.converts_arguments(policy) {
            self.converter.to_backend_in_place(&mut args, client);
        }
        let mut result = work(args);
        if self.converts_result(policy) {
            self.converter.to_client_in_place(&mut result, client);
        }
        result
    }

    /// Async variant of [`around`](Self::around).
    pub async fn around_async<A, R, F, Fut>(&self, client: &Zone, policy: ConvertPolicy, mut args: A, work: F) -> R
    where
        A: Walk,
        R: Walk,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = R>,
    {
        if self.converts_arguments(policy) {
            self.converter.to_backend_in_place(&mut args, client);
        }
        let mut result = work(args).await;
        if self.converts_result(policy) {
            self.converter.to_client_in_place(&mut result, client);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn gate(config: KronosConfig) -> InvocationGate {
        let converter = Arc::new(TimeZoneConverter::new(&config).unwrap());
        InvocationGate::new(converter, &config)
    }

    fn shanghai() -> Zone {
        Zone::parse("Asia/Shanghai").unwrap()
    }

    #[test]
    fn only_marked_arguments_are_converted() {
        let gate = gate(KronosConfig::default());
        let mut marked = at("2025-05-20 18:00:00");
        let mut plain = at("2025-05-20 18:00:00");
        let mut text = "20/05/2025 18:00".to_string();
        gate.inbound(
            &shanghai(),
            &mut [
                Argument::marked(&mut marked),
                Argument::unmarked(&mut plain),
                Argument::marked(&mut text).with_format("dd/MM/yyyy HH:mm"),
            ],
        );
        assert_eq!(marked, at("2025-05-20 10:00:00"));
        assert_eq!(plain, at("2025-05-20 18:00:00"));
        assert_eq!(text, "20/05/2025 10:00");
    }

    #[test]
    fn around_converts_both_sides() {
        let gate = gate(KronosConfig::default());
        let result = gate.around(&shanghai(), ConvertPolicy::QUERY, at("2025-05-20 18:00:00"), |backend| {
            assert_eq!(backend, at("2025-05-20 10:00:00"));
            vec![backend]
        });
        assert_eq!(result, [at("2025-05-20 18:00:00")]);

        let result = gate.around(&shanghai(), ConvertPolicy::COMMAND, at("2025-05-20 18:00:00"), |backend| backend);
        assert_eq!(result, at("2025-05-20 10:00:00"));
    }

    #[test]
    fn disabled_gate_passes_through() {
        let gate = gate(KronosConfig {
            enabled: false,
            ..KronosConfig::default()
        });
        let result = gate.around(&shanghai(), ConvertPolicy::QUERY, at("2025-05-20 18:00:00"), |v| v);
        assert_eq!(result, at("2025-05-20 18:00:00"));
        assert_eq!(gate.outbound(&shanghai(), at("2025-05-20 10:00:00")), at("2025-05-20 10:00:00"));
    }

    #[test]
    fn response_switch_only_affects_results() {
        let gate = gate(KronosConfig {
            handle_response: false,
            ..KronosConfig::default()
        });
        let result = gate.around(&shanghai(), ConvertPolicy::QUERY, at("2025-05-20 18:00:00"), |v| v);
        assert_eq!(result, at("2025-05-20 10:00:00"));
    }

    #[tokio::test]
    async fn around_async_awaits_work() {
        let gate = gate(KronosConfig::default());
        let result = gate
            .around_async(&shanghai(), ConvertPolicy::QUERY, Some(at("2025-05-20 18:00:00")), |arg| async move {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                arg
            })
            .await;
        assert_eq!(result, Some(at("2025-05-20 18:00:00")));

        let none: Option<NaiveDateTime> =
            gate.around_async(&shanghai(), ConvertPolicy::QUERY, None, |arg| async move { arg }).await;
        assert_eq!(none, None);
    }
}
