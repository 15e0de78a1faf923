use crate::{
    admission::{read_manifest, Admission},
    config::{TemplateExecutor, TemplateId},
    core::ProxyEngineVersion,
    log::{self, LogFormat},
    ports::parse_portset,
};
use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::{
    collections::BTreeSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Ports the default servers listen on. Listeners may never claim them.
const RESERVED_PORTS: [u16; 2] = [80, 443];

#[derive(Debug, Parser)]
#[clap(
    name = "nginx-ingress",
    about = "Compiles ingress resources into NGINX configuration"
)]
pub struct Args {
    #[clap(
        long,
        global = true,
        default_value = "nginx_ingress=info,warn",
        env = "NGINX_INGRESS_LOG"
    )]
    log_level: String,

    #[clap(long, global = true, value_enum, default_value = "plain")]
    log_format: LogFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validates the custom resources of a manifest.
    Validate(ValidateArgs),

    /// Renders a configuration file from its intermediate representation.
    Render(RenderArgs),

    /// Parses the version reported by `nginx -v`.
    Version(VersionArgs),
}

#[derive(Debug, clap::Args)]
struct ValidateArgs {
    /// A YAML manifest, possibly holding several documents.
    #[clap(long, short)]
    file: PathBuf,

    #[clap(long, default_value = "8080")]
    nginx_status_port: u16,

    #[clap(long)]
    enable_prometheus_metrics: bool,

    #[clap(long, default_value = "9113")]
    prometheus_metrics_listen_port: u16,

    #[clap(long)]
    enable_service_insight: bool,

    #[clap(long, default_value = "9114")]
    service_insight_listen_port: u16,

    #[clap(long)]
    enable_tls_passthrough: bool,

    #[clap(long)]
    enable_snippets: bool,

    #[clap(long, env = "NGINX_PLUS")]
    nginx_plus: bool,

    /// Additional ports listeners may not use, e.g. `8081,9000-9010`.
    #[clap(long, default_value = "")]
    extra_forbidden_ports: String,
}

#[derive(Debug, clap::Args)]
struct RenderArgs {
    #[clap(long)]
    template: TemplateId,

    /// The intermediate representation, as JSON (`.json`) or YAML.
    #[clap(long)]
    config: PathBuf,

    /// The version reported by `nginx -v`.
    #[clap(long, env = "NGINX_VERSION")]
    nginx_version: String,

    #[clap(long, env = "NGINX_PLUS")]
    nginx_plus: bool,

    /// Writes the configuration to a file instead of stdout.
    #[clap(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct VersionArgs {
    #[clap(long)]
    raw: String,

    /// Prints the parsed version as JSON.
    #[clap(long)]
    json: bool,
}

// === impl Args ===

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            command,
        } = self;

        log::init(&log_level, log_format)?;

        match command {
            Command::Validate(args) => args.run(),
            Command::Render(args) => args.run(),
            Command::Version(args) => args.run(),
        }
    }
}

// === impl ValidateArgs ===

impl ValidateArgs {
    fn forbidden_ports(&self) -> Result<BTreeSet<u16>> {
        let mut ports = parse_portset(&self.extra_forbidden_ports)
            .context("invalid --extra-forbidden-ports")?;
        ports.extend(RESERVED_PORTS);
        ports.insert(self.nginx_status_port);
        if self.enable_prometheus_metrics {
            ports.insert(self.prometheus_metrics_listen_port);
        }
        if self.enable_service_insight {
            ports.insert(self.service_insight_listen_port);
        }
        Ok(ports)
    }

    fn run(self) -> Result<()> {
        let forbidden_ports = self.forbidden_ports()?;
        debug!(?forbidden_ports);

        let manifest = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let objects = read_manifest(&manifest)?;

        let mut admission = Admission::new(
            forbidden_ports,
            self.enable_tls_passthrough,
            self.enable_snippets,
            self.nginx_plus,
        );
        let decisions = admission.admit_all(objects);

        let mut stdout = io::stdout().lock();
        for decision in &decisions {
            writeln!(stdout, "{decision}")?;
        }

        let denied = decisions.iter().filter(|d| !d.is_admitted()).count();
        ensure!(
            denied == 0,
            "{denied} of {} resources denied",
            decisions.len()
        );
        Ok(())
    }
}

// === impl RenderArgs ===

impl RenderArgs {
    fn run(self) -> Result<()> {
        let version = ProxyEngineVersion::parse(&self.nginx_version);
        check_edition(&version, self.nginx_plus)?;
        info!(%version, edition = %version.edition(), "Rendering for installed engine");

        let executor = TemplateExecutor::from_version(&version)?;
        let input = fs::read_to_string(&self.config)
            .with_context(|| format!("failed to read {}", self.config.display()))?;
        let output = render(&executor, self.template, &self.config, &input)?;

        match &self.output {
            Some(path) => fs::write(path, &output)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => io::stdout().lock().write_all(&output)?,
        }
        Ok(())
    }
}

// === impl VersionArgs ===

impl VersionArgs {
    fn run(self) -> Result<()> {
        let version = ProxyEngineVersion::parse(&self.raw);
        let mut stdout = io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, &version)?;
            writeln!(stdout)?;
        } else {
            writeln!(stdout, "version: {version}")?;
            writeln!(stdout, "nginx-plus: {}", version.is_commercial_edition)?;
        }
        Ok(())
    }
}

/// The edition requested on the command line must match the installed
/// binary, or the wrong template family would be rendered.
fn check_edition(version: &ProxyEngineVersion, nginx_plus: bool) -> Result<()> {
    match (nginx_plus, version.is_commercial_edition) {
        (true, false) => bail!(
            "--nginx-plus is set but the installed engine is not NGINX Plus: {:?}",
            version.raw
        ),
        (false, true) => bail!(
            "the installed engine is NGINX Plus but --nginx-plus is not set: {:?}",
            version.raw
        ),
        _ => Ok(()),
    }
}

fn render(
    executor: &TemplateExecutor,
    template: TemplateId,
    path: &Path,
    input: &str,
) -> Result<Vec<u8>> {
    let output = match template {
        TemplateId::Main => executor.execute_main(&decode(path, input)?),
        TemplateId::Ingress => executor.execute_ingress(&decode(path, input)?),
        TemplateId::VirtualServer => executor.execute_virtual_server(&decode(path, input)?),
        TemplateId::TransportServer => executor.execute_transport_server(&decode(path, input)?),
        TemplateId::TlsPassthroughHosts => {
            executor.execute_tls_passthrough_hosts(&decode(path, input)?)
        }
    };
    output.with_context(|| format!("failed to render {template} configuration"))
}

fn decode<T: DeserializeOwned>(path: &Path, input: &str) -> Result<T> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let decoded = if is_json {
        serde_json::from_str(input).map_err(anyhow::Error::from)
    } else {
        serde_yaml::from_str(input).map_err(anyhow::Error::from)
    };
    decoded.with_context(|| format!("invalid configuration in {}", path.display()))
}
