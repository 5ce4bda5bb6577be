// Ticket identifier minting

use rand::Rng;

const TICKET_PREFIX: &str = "DEL-";
const SUFFIX_LEN: usize = 6;
const HEX: &[u8] = b"0123456789ABCDEF";

/// Mint a candidate ticket id: `DEL-` plus 6 uppercase hex characters.
/// Uniqueness is enforced by the grievances UNIQUE constraint; the store
/// regenerates on the (practically unreachable) collision.
pub fn mint_ticket_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect();
    format!("{TICKET_PREFIX}{suffix}")
}

/// Whether a string looks like a ticket id we minted
pub fn is_ticket_id(s: &str) -> bool {
    s.len() == TICKET_PREFIX.len() + SUFFIX_LEN
        && s.starts_with(TICKET_PREFIX)
        && s[TICKET_PREFIX.len()..].chars().all(|c| c.is_ascii_alphanumeric())
}
