use anyhow::Result;

use opal_chess::board::zobrist::init_zobrist;
use opal_chess::movegen::magic::init_attack_tables;
use opal_chess::uci::protocol::run_uci;

fn main() -> Result<()> {
    init_attack_tables();
    init_zobrist();

    run_uci()
}
