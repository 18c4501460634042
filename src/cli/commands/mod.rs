pub mod logging;
pub mod secrets;

use crate::{
    config::{DEFAULT_BANK, DEFAULT_CARD, DEFAULT_CURRENCY},
    portal::{Amount, Validity},
};
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_AMOUNT: &str = "amount";
pub const ARG_CARD: &str = "card";
pub const ARG_EXPIRE_IN: &str = "expire-in";
pub const ARG_LIST: &str = "list";
pub const ARG_BANK: &str = "bank";
pub const ARG_CURRENCY: &str = "currency";
pub const ARG_POLL_TIMEOUT: &str = "poll-timeout";

#[must_use]
pub fn validator_amount() -> ValueParser {
    ValueParser::from(move |amount: &str| -> std::result::Result<Amount, String> { amount.parse() })
}

#[must_use]
pub fn validator_validity() -> ValueParser {
    ValueParser::from(move |months: &str| -> std::result::Result<Validity, String> {
        months.parse()
    })
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("ecarte")
        .about("Generate single-use virtual card numbers from the e-Carte Bleue portal")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_AMOUNT)
                .help("Amount ceiling of the card, in euro (e.g. 42 or 19.90)")
                .required_unless_present(ARG_LIST)
                .value_parser(validator_amount()),
        )
        .arg(
            Arg::new(ARG_CARD)
                .short('c')
                .long(ARG_CARD)
                .help("Card profile, selects the credentials in the secret store")
                .env("ECARTE_CARD")
                .default_value(DEFAULT_CARD),
        )
        .arg(
            Arg::new(ARG_EXPIRE_IN)
                .short('e')
                .long(ARG_EXPIRE_IN)
                .help("Validity in months: 3, 6, 9, 12, 15, 18, 21 or 24")
                .env("ECARTE_EXPIRE_IN")
                .default_value("3")
                .value_parser(validator_validity()),
        )
        .arg(
            Arg::new(ARG_LIST)
                .short('l')
                .long(ARG_LIST)
                .help("List previously issued numbers instead of issuing one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_BANK)
                .short('b')
                .long(ARG_BANK)
                .help("Bank segment of the portal URL (caisse-epargne, sg, banquepopulaire, ...)")
                .env("ECARTE_BANK")
                .default_value(DEFAULT_BANK),
        )
        .arg(
            Arg::new(ARG_CURRENCY)
                .long(ARG_CURRENCY)
                .help("Currency code posted with the amount")
                .env("ECARTE_CURRENCY")
                .default_value(DEFAULT_CURRENCY),
        )
        .arg(
            Arg::new(ARG_POLL_TIMEOUT)
                .long(ARG_POLL_TIMEOUT)
                .help("Give up waiting for the mobile app approval after this many seconds")
                .env("ECARTE_POLL_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = secrets::with_args(command);
    logging::with_args(command)
}
