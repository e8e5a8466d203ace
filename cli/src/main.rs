mod arg_parser;
mod client_cli;

use arg_parser::{ArgParser, SubCommand};
use client_cli::ClientCli;

use clap::Parser;
use std::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn error::Error>> {
    let args = ArgParser::parse();
    let client = ClientCli::connect(&args.user, &args.server);

    match args.sub_command {
        SubCommand::Create { command, timeout } => {
            client.create_job(&command, timeout).await?;
        }
        SubCommand::Start { job_id } => {
            client.start_job(job_id).await?;
        }
        SubCommand::Stop { job_id } => {
            client.stop_job(job_id).await?;
        }
        SubCommand::Status { job_id } => {
            client.query_status(job_id).await?;
        }
        SubCommand::List => {
            client.list_jobs().await?;
        }
    }

    Ok(())
}
