use crate::CLAP_STYLING;
use clap::arg;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("reflector")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("reflector")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-b --"bind" <ADDR>)
                .required(false)
                .help("Address to listen on")
                .default_value("0.0.0.0"),
        )
        .arg(
            arg!(-p --"port" <PORT>)
                .required(false)
                .help("Port to listen on")
                .value_parser(clap::value_parser!(u16))
                .default_value("8080"),
        )
        .arg(
            arg!(-t --"timeout" <SECS>)
                .required(false)
                .help("Upstream fetch timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
}
