//! Room code generation.
//!
//! Codes are [`RoomCode::LEN`] characters drawn uniformly from
//! [`RoomCode::ALPHABET`]. Uniqueness is only guaranteed against the
//! rooms live at generation time; a released code may be handed out
//! again later.

use rand::Rng;
use volley_protocol::RoomCode;

/// Draws one code. May collide with a live room.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let alphabet = RoomCode::ALPHABET;
    let code: String = (0..RoomCode::LEN)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect();
    RoomCode::new(code)
}

/// Draws codes until one is not taken.
///
/// With 36^5 possible codes this terminates almost immediately for any
/// realistic number of live rooms.
pub fn generate_unique<R, F>(rng: &mut R, is_taken: F) -> RoomCode
where
    R: Rng + ?Sized,
    F: Fn(&RoomCode) -> bool,
{
    loop {
        let code = generate(rng);
        if !is_taken(&code) {
            return code;
        }
    }
}
