use colored::Colorize;
use mq::commands::{CmdMessage, MessageLevel};
use mq::error::ArgsError;

const USAGE: &str = r#"Usage: mq -[ei] <machine> <queue> [-t] [file-pattern ...] [-m <max>]

Options:
  -e <machine> <queue>   Export queued messages into new files in the current directory
  -i <machine> <queue>   Import every file matching the patterns into the queue
  -t                     Use one transaction per message
  -m, -max <n>           Export at most <n> messages (at least one receive is always made)

Machine:
  .                      Local private queue
  10.0.0.5               Direct TCP to an IPv4 address
  srv01                  Direct to a host name

Examples:
  mq -i . orders *.xml
  mq -e srv01 orders -t -m 10"#;

pub(super) fn usage() -> &'static str {
    USAGE
}

pub(super) fn print_usage() {
    println!("{}", usage());
}

pub(super) fn print_args_error(error: &ArgsError) {
    println!("{}", error.to_string().red());
    println!();
    print_usage();
}

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}
