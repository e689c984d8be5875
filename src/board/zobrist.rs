use once_cell::sync::Lazy;

use super::bitboard::{get_file, iter_bits};
use super::position::{Position, Side, NO_SQUARE};

/// Zobrist key tables. Published for a future transposition table; no core
/// subsystem consumes them today.
pub struct ZobristKeys {
    pub pieces: [[u64; 64]; 12],
    pub en_passant: [u64; 8],
    pub castling: [u64; 16],
    pub side_to_move: u64,
}

struct FastRng {
    state: u64,
}

impl FastRng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = FastRng::new(0x1234_5678_90AB_CDEF);
    let mut keys = ZobristKeys {
        pieces: [[0; 64]; 12],
        en_passant: [0; 8],
        castling: [0; 16],
        side_to_move: 0,
    };

    for piece in 0..12 {
        for square in 0..64 {
            keys.pieces[piece][square] = rng.next();
        }
    }
    for file in 0..8 {
        keys.en_passant[file] = rng.next();
    }
    for rights in 0..16 {
        keys.castling[rights] = rng.next();
    }
    keys.side_to_move = rng.next();

    keys
});

/// Force key generation; call once at startup.
pub fn init_zobrist() {
    Lazy::force(&KEYS);
}

#[inline(always)]
pub fn piece_key(piece: usize, square: u8) -> u64 {
    KEYS.pieces[piece][(square & 63) as usize]
}

#[inline(always)]
pub fn en_passant_key(file: u8) -> u64 {
    KEYS.en_passant[(file & 7) as usize]
}

#[inline(always)]
pub fn castling_key(rights: u8) -> u64 {
    KEYS.castling[(rights & 0xF) as usize]
}

#[inline(always)]
pub fn side_key() -> u64 {
    KEYS.side_to_move
}

/// Full key of a position, recomputed from scratch.
pub fn position_key(pos: &Position) -> u64 {
    let mut key = 0u64;

    for (piece, bb) in pos.pieces.iter().enumerate() {
        for square in iter_bits(*bb) {
            key ^= piece_key(piece, square);
        }
    }

    if pos.en_passant_square != NO_SQUARE {
        key ^= en_passant_key(get_file(pos.en_passant_square));
    }
    key ^= castling_key(pos.castling_rights);
    if pos.side_to_move == Side::Black {
        key ^= side_key();
    }

    key
}
