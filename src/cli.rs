use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slotbot", version, about = "Books recurring gym classes the moment booking opens")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run one booking trigger for a recurring booking")]
    Book {
        chain: String,
        user: i64,
        booking_id: i64,

        /// Authenticate and locate the class without booking.
        #[arg(long)]
        check: bool,
    },

    #[command(about = "Cancel the user's booking of a class")]
    Cancel {
        chain: String,
        user: i64,
        class_id: String,
    },

    #[command(about = "Manage the stored session view")]
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },

    #[command(about = "Manage scheduled booking triggers")]
    Cron {
        #[command(subcommand)]
        command: CronCommand,
    },

    #[command(about = "Send reminders for imminent booked classes")]
    Remind,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    #[command(about = "Pull sessions from providers and persist them")]
    Pull {
        #[command(flatten)]
        filter: UserFilter,
    },
}

#[derive(Subcommand)]
pub enum CronCommand {
    #[command(about = "Recompile cron jobs from recurring bookings")]
    Refresh {
        #[command(flatten)]
        filter: UserFilter,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct UserFilter {
    #[arg(long)]
    pub chain: Option<String>,

    #[arg(long)]
    pub user: Option<i64>,
}
