use kronos_api_server::ServerError;

use crate::config::{ServeArgs, ServerConfig};

pub fn run(args: ServeArgs) -> Result<(), ServerError> {
    let config = ServerConfig::load(&args.config)?;
    config.kronos.validate()?;

    let kronos = &config.kronos;
    println!("config:              {}", args.config);
    println!("api port:            {}", args.port.unwrap_or(config.api_port));
    println!("enabled:             {}", kronos.enabled);
    println!("backend zone:        {}", kronos.backend_zone()?);
    println!("default client zone: {}", kronos.default_client_zone()?);
    println!("zone header:         {}", kronos.client_zone_id_header);
    println!("date-time format:    {}", kronos.default_date_time_format);
    Ok(())
}
