use clap::Parser;
use deploy_scripts::{cli::Cli, rpc::RpcEnvironment};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let Cli {
        priv_key,
        rpc_url,
        deployments_dir,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let env = RpcEnvironment::connect(&priv_key, &rpc_url).await?;

    command.run(&env, &deployments_dir).await
}
