use std::sync::Arc;
use std::time::Duration;

use organization_service::cli::{self, Invocation};
use organization_service::global::Global;
use organization_service::{api, logging};
use tokio::signal::unix::{signal, Signal, SignalKind};

struct SignalHandler {
	interrupt: Signal,
	terminate: Signal,
}

impl SignalHandler {
	fn new() -> std::io::Result<Self> {
		Ok(Self {
			interrupt: signal(SignalKind::interrupt())?,
			terminate: signal(SignalKind::terminate())?,
		})
	}

	async fn recv(&mut self) {
		tokio::select! {
			_ = self.interrupt.recv() => {}
			_ = self.terminate.recv() => {}
		}
	}
}

#[tokio::main]
async fn main() {
	let config = match cli::parse(std::env::args_os(), std::env::vars()) {
		Ok(Invocation::Run(config)) => config,
		Ok(Invocation::Generate { file, config }) => {
			if let Err(err) = cli::generate(&file, &config) {
				eprintln!("{err:#}");
				std::process::exit(1);
			}

			println!("Generated configuration file: {}", file.display());
			std::process::exit(0);
		}
		Err(err) => {
			if let Some(err) = err.downcast_ref::<clap::Error>() {
				err.exit();
			}

			eprintln!("{err:#}");
			std::process::exit(1);
		}
	};

	if let Err(err) = logging::init(&config.logging.level, config.logging.mode) {
		eprintln!("{err}");
		std::process::exit(1);
	}

	tracing::info!("starting organization service");

	let global = Arc::new({
		match Global::new(config).await {
			Ok(global) => global,
			Err(err) => {
				tracing::error!("error setting up global: {err:#}");
				std::process::exit(1);
			}
		}
	});

	let mut signal = match SignalHandler::new() {
		Ok(signal) => signal,
		Err(err) => {
			tracing::error!("error installing signal handlers: {err}");
			std::process::exit(1);
		}
	};

	let (shutdown, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
	let mut server = tokio::spawn(api::run(global, async move {
		shutdown_rx.await.ok();
	}));

	tokio::select! {
		_ = signal.recv() => {
			tracing::info!("received signal, shutting down");
		}
		result = &mut server => {
			match result {
				Ok(Ok(())) => tracing::warn!("http server stopped unexpectedly without error"),
				Ok(Err(err)) => tracing::error!("error in http server: {err:#}"),
				Err(err) => tracing::error!("http server task failed: {err}"),
			}

			std::process::exit(1);
		}
	}

	shutdown.send(()).ok();

	tokio::select! {
		_ = signal.recv() => {
			tracing::warn!("received signal again, forcing exit");
		},
		r = tokio::time::timeout(Duration::from_secs(60), server) => {
			if r.is_err() {
				tracing::warn!("shutdown timed out, forcing exit");
			} else {
				tracing::info!("organization service stopped");
			}
		}
	}

	std::process::exit(0);
}
