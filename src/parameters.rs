use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Runs the form gateway until it receives SIGINT or SIGTERM.
    Serve {
        /// Port to listen on, overriding the PORT environment variable.
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Checks that the variables required by the selected storage backend are set.
    ///
    /// For the spreadsheet backend it also describes the shape of the private key (length,
    /// markers, escaped newlines) without printing any of it.
    VerifyEnv,
}
