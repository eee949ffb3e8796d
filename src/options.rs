use std::time::Duration;

use message::RestartMode;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(about = "query time from and restart a GNSS receiver over its binary protocol")]
pub struct Options {
    #[structopt(short, long)]
    pub serial_port: String,

    #[structopt(short, long, default_value = "115200")]
    pub baud: u32,

    /// How long to wait for each response.
    #[structopt(long, default_value = "2000")]
    pub timeout_ms: u64,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub enum Command {
    /// Poll the receiver's GPS time and print it next to the local clock.
    QueryTime {
        /// Pause between queries.
        #[structopt(long, default_value = "1000")]
        interval_ms: u64,

        /// Quiet period to wait for before each query, so the query does not
        /// land in the middle of the receiver's periodic output.
        #[structopt(long, default_value = "250")]
        settle_ms: u64,

        /// Stop after this many queries.
        #[structopt(long)]
        count: Option<usize>,
    },

    /// Restart the receiver, stamped with the current UTC time.
    Reboot {
        #[structopt(long, default_value = "cold")]
        mode: RestartMode,
    },
}

impl Options {
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
