use std::process::ExitCode;
use tracing::{error, info};
use lora_gateway_service::channels::domain::Channels;
use lora_gateway_service::connectivity::logic::{ConnectivityMonitor, TcpLinkProbe};
use lora_gateway_service::context::domain::AppContext;
use lora_gateway_service::gateway::logic::Gateway;
use lora_gateway_service::radio::logic::{start_modem_bridge, ModemRadio};
use lora_gateway_service::system::domain::{init_tracing, System};
use lora_gateway_service::uplink::logic::HttpUplink;
use lora_gateway_service::web::logic::start_web_server;


#[tokio::main]
async fn main() -> ExitCode {

    let system = match System::new() {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Error: configuración inválida: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&system);
    system.log_startup();

    let channels = Channels::new();
    let app_context = AppContext::new(system);
    let system = app_context.system.clone();

    if let Err(e) = start_modem_bridge(&system.radio_bind_addr,
                                       channels.modem_to_gateway,
                                       channels.modem_from_gateway).await {
        error!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let uplink = match HttpUplink::new(system.backend_url()) {
        Ok(uplink) => uplink,
        Err(e) => {
            error!("Error: no se pudo crear el cliente HTTP: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = start_web_server(app_context.clone()).await {
        error!("Error: no se pudo abrir el puerto web {}: {}", system.web_port, e);
        return ExitCode::FAILURE;
    }

    let radio = ModemRadio::new(channels.gateway_from_modem,
                                channels.gateway_to_modem,
                                app_context.clock.clone());

    let probe = TcpLinkProbe::new(format!("{}:{}", system.backend_host, system.backend_port),
                                  system.wireless_interface.clone());

    let gateway = Gateway::new(radio,
                               uplink,
                               ConnectivityMonitor::new(probe),
                               &app_context);

    tokio::select! {
        _ = gateway.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Error: escuchando la señal de apagado: {}", e);
            }
            info!("Info: apagando el gateway");
        }
    }

    ExitCode::SUCCESS
}
