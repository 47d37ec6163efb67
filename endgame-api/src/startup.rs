use std::fs::File;
use std::io::BufReader;
use std::{net::TcpListener, sync::Arc};

use actix_web::{App, HttpServer, dev::Server, web};
use endgame_config::shared::TlsConfig;
use endgame_telemetry::metrics::init_metrics_handle;
use metrics_exporter_prometheus::PrometheusHandle;
use rustls::ServerConfig;
use thiserror::Error;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

use crate::{
    admission::AdmissionGate,
    config::ApiConfig,
    k8s::http::HttpK8sClient,
    metrics::register_metrics,
    routes::{health_check::health_check, metrics::metrics, validate::validate_etcd_pod},
};

/// Largest admission review body accepted. A pod deletion review embeds the
/// whole pod as `oldObject`, which can exceed actix' 256 KiB default.
const MAX_REVIEW_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no private key found in {0}")]
    MissingPrivateKey(String),

    #[error("no certificate found in {0}")]
    MissingCertificate(String),

    #[error("invalid tls material: {0}")]
    Rustls(#[from] rustls::Error),
}

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let tls = if config.application.tls.enabled {
            Some(load_tls_config(&config.application.tls)?)
        } else {
            warn!("tls is disabled, the api server will refuse to call this webhook");
            None
        };

        let k8s_client = HttpK8sClient::new(&config.kube, config.gate.exec_timeout()).await?;
        let gate = AdmissionGate::new(Arc::new(k8s_client), &config.gate, &config.etcdctl);

        let metrics_handle = init_metrics_handle()?;

        info!(
            port,
            container_name = %config.gate.container_name,
            exec_timeout_secs = config.gate.exec_timeout_secs,
            "starting etcd termination gate"
        );

        let server = run(listener, gate, metrics_handle, tls)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Loads the PEM certificate chain and private key into a rustls server config.
pub fn load_tls_config(config: &TlsConfig) -> Result<ServerConfig, TlsError> {
    let certs = rustls_pemfile::certs(&mut open_pem(&config.cert_path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: config.cert_path.clone(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::MissingCertificate(config.cert_path.clone()));
    }

    let key = rustls_pemfile::private_key(&mut open_pem(&config.key_path)?)
        .map_err(|source| TlsError::Read {
            path: config.key_path.clone(),
            source,
        })?
        .ok_or_else(|| TlsError::MissingPrivateKey(config.key_path.clone()))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let server_config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(server_config)
}

fn open_pem(path: &str) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_string(),
            source,
        })
}

/// Starts serving the webhook routes on `listener`.
///
/// Serves plain HTTP when `tls` is `None`, which is what the tests use.
pub fn run(
    listener: TcpListener,
    gate: AdmissionGate,
    metrics_handle: PrometheusHandle,
    tls: Option<ServerConfig>,
) -> Result<Server, std::io::Error> {
    register_metrics();

    let gate = web::Data::new(gate);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                sentry::integrations::actix::Sentry::builder()
                    .capture_server_errors(true)
                    .finish(),
            )
            .wrap(TracingLogger::default())
            .app_data(web::PayloadConfig::new(MAX_REVIEW_BYTES))
            .app_data(gate.clone())
            .app_data(web::ThinData(metrics_handle.clone()))
            .service(health_check)
            .service(metrics)
            .service(validate_etcd_pod)
    });

    let server = match tls {
        Some(tls) => server.listen_rustls_0_23(listener, tls)?,
        None => server.listen(listener)?,
    };

    Ok(server.run())
}
