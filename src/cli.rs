// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn page_args(cmd: Command) -> Command {
    json_args(cmd)
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_parser(clap::value_parser!(u32))
                .default_value("0"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_parser(clap::value_parser!(u32).range(1..=50))
                .default_value("50"),
        )
}

fn id_arg() -> Arg {
    Arg::new("id").long("id").required(true)
}

pub fn build_cli() -> Command {
    Command::new("nftmarket")
        .version(crate_version!())
        .about("Mint, list and trade NFTs against an append-only balance ledger")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("SQLite database file (default: NFTMARKET_DB or the platform data dir)"),
        )
        .arg(
            Arg::new("as")
                .long("as")
                .global(true)
                .value_name("USER")
                .help("Act as this user instead of default-user"),
        )
        .subcommand(Command::new("init").about("Create the database and seed users"))
        .subcommand(
            Command::new("user")
                .about("Marketplace users")
                .subcommand(
                    Command::new("add")
                        .about("Register a user")
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .help("Opening balance (default 0)"),
                        ),
                )
                .subcommand(page_args(Command::new("list").about("List users, newest first")))
                .subcommand(json_args(Command::new("show").arg(id_arg()))),
        )
        .subcommand(
            Command::new("nft")
                .about("Mint, inspect and trade NFTs")
                .subcommand(json_args(
                    Command::new("mint")
                        .about("Mint an NFT owned by the acting user")
                        .arg(Arg::new("file").long("file").required(true).value_name("PATH"))
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("creator")
                                .long("creator")
                                .action(ArgAction::Append)
                                .help("Co-creator username; repeat for several"),
                        ),
                ))
                .subcommand(page_args(Command::new("list").about("List NFTs, newest first")))
                .subcommand(json_args(
                    Command::new("show").arg(id_arg()).arg(
                        Arg::new("out")
                            .long("out")
                            .value_name("PATH")
                            .help("Write the original image to this file"),
                    ),
                ))
                .subcommand(json_args(
                    Command::new("history")
                        .about("Every trade of one NFT")
                        .arg(id_arg()),
                ))
                .subcommand(json_args(
                    Command::new("buy")
                        .about("Buy an NFT as the acting user")
                        .arg(id_arg())
                        .arg(Arg::new("seller").long("seller").required(true))
                        .arg(Arg::new("price").long("price").required(true))
                        .arg(
                            Arg::new("buyer")
                                .long("buyer")
                                .help("Defaults to the acting user"),
                        ),
                ))
                .subcommand(json_args(
                    Command::new("sell")
                        .about("Sell an NFT owned by the acting user")
                        .arg(id_arg())
                        .arg(Arg::new("buyer").long("buyer").required(true))
                        .arg(Arg::new("price").long("price").required(true))
                        .arg(
                            Arg::new("seller")
                                .long("seller")
                                .help("Defaults to the acting user"),
                        ),
                )),
        )
        .subcommand(
            Command::new("tx")
                .about("Trade transactions")
                .subcommand(page_args(Command::new("list").about("List trades, newest first"))),
        )
        .subcommand(
            Command::new("balance")
                .about("Balance ledger")
                .subcommand(page_args(
                    Command::new("history")
                        .about("Balance movements, newest first")
                        .arg(Arg::new("user").long("user").help("Only this username")),
                ))
                .subcommand(json_args(
                    Command::new("show")
                        .about("Current balance")
                        .arg(
                            Arg::new("user")
                                .long("user")
                                .help("Defaults to the acting user"),
                        ),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export ledger data")
                .subcommand(export_cmd("transactions"))
                .subcommand(export_cmd("balances")),
        )
        .subcommand(Command::new("doctor").about("Check ledger and ownership consistency"))
        .subcommand(
            Command::new("serve").about("Run the HTTP API").arg(
                Arg::new("bind")
                    .long("bind")
                    .value_name("ADDR")
                    .help("Listen address (default: NFTMARKET_BIND or 0.0.0.0:8000)"),
            ),
        )
}

fn export_cmd(name: &'static str) -> Command {
    Command::new(name)
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["csv", "json"])
                .default_value("csv"),
        )
        .arg(Arg::new("out").long("out").required(true).value_name("PATH"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_identity_flag_reaches_subcommands() {
        let m = build_cli().get_matches_from([
            "nftmarket", "nft", "buy", "--id", "1", "--seller", "dummy-user-1", "--price", "10",
            "--as", "dummy-user-2",
        ]);
        assert_eq!(m.get_one::<String>("as").map(String::as_str), Some("dummy-user-2"));
    }
}
