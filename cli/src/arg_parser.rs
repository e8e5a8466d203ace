use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Talk to an HTTP job server
#[derive(Debug, Parser)]
#[clap(name = "job-cli")]
pub struct ArgParser {
    /// Base URL of the server
    #[clap(
        short = 's',
        long = "server",
        env = "JOB_SERVER_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub server: String,
    /// User name sent in the Authorization header
    #[clap(short = 'u', long = "user", env = "JOB_USER")]
    pub user: String,
    /// The sub-command to use
    #[clap(subcommand)]
    pub sub_command: SubCommand,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum SubCommand {
    /// create a new job without starting it
    Create {
        /// shell command line to run
        command: String,

        #[clap(long)]
        /// seconds before the job is killed
        timeout: Option<u64>,
    },
    /// start a created job
    Start {
        /// Uuid v4 string
        job_id: Uuid,
    },
    /// stop a started job
    Stop {
        /// Uuid v4 string
        job_id: Uuid,
    },
    /// get a job's status, logs and reason for exit
    Status {
        /// Uuid v4 string
        job_id: Uuid,
    },
    /// list every job
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_with_timeout() {
        let args = ArgParser::try_parse_from([
            "job-cli", "-u", "writer", "create", "echo hi", "--timeout", "5",
        ])
        .unwrap();
        assert_eq!(args.server, "http://127.0.0.1:8080");
        assert_eq!(
            args.sub_command,
            SubCommand::Create {
                command: "echo hi".into(),
                timeout: Some(5)
            }
        );
    }

    #[test]
    fn job_id_must_be_a_uuid() {
        assert!(ArgParser::try_parse_from(["job-cli", "-u", "writer", "stop", "42"]).is_err());
        let id = Uuid::new_v4();
        let id_arg = id.to_string();
        let args = ArgParser::try_parse_from(["job-cli", "-u", "reader", "status", id_arg.as_str()])
            .unwrap();
        assert_eq!(args.sub_command, SubCommand::Status { job_id: id });
    }
}
