fn main() {
    if let Err(e) = g_trade_journal_lib::run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
