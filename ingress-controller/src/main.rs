#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

fn main() -> anyhow::Result<()> {
    nginx_ingress_controller_runtime::Args::parse_and_run()
}
