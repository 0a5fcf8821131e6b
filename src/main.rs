use std::path::PathBuf;
use std::sync::Arc;

use gatehouse::config::Config;
use gatehouse::http::dispatch::{Handler, Settings};
use gatehouse::http::headers::HeaderRegistry;
use gatehouse::http::mime::MimeRegistry;
use gatehouse::http::request::Request;
use gatehouse::http::response::Response;
use gatehouse::http::transport::Transport;
use gatehouse::server::{self, ServerContext};

struct Greeter;

impl Handler for Greeter {
    fn on_request(&self, req: &mut Request, out: &mut dyn Transport) {
        let mut response = Response::ok("Hello from Gatehouse\n");
        if !req.keep_alive() {
            response.headers.insert("connection".to_string(), "close".to_string());
        }
        if let Err(e) = out.send(response) {
            tracing::warn!(error = %e, path = %req.path, "Failed to send response");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = match std::env::var_os("CONFIG") {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::load(),
    };

    let level = cfg
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();

    let headers = HeaderRegistry::initialize();
    let mime = if cfg.mime_case_insensitive {
        MimeRegistry::case_insensitive()
    } else {
        MimeRegistry::new()
    };
    mime.register_builtin(cfg.mime_registry);

    let mut settings = Settings::new(Arc::new(Greeter));
    if let Some(root) = &cfg.public_folder {
        tracing::info!(root = %root.display(), "Serving public folder");
        settings = settings.with_public_folder(root);
    }
    let ctx = Arc::new(ServerContext::new(settings, headers, Arc::new(mime)));

    tokio::select! {
        res = server::listener::run(&cfg, Arc::clone(&ctx)) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    ctx.shutdown();
    drop(ctx);
    HeaderRegistry::teardown();
    Ok(())
}
