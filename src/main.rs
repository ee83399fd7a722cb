use envrecon::presentation::cli::CliApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is installed per subcommand once the output directory is known
    let app = CliApp::new();
    app.run().await
}
