use chrono::Utc;
use rand::Rng;

const PREFIX: &str = "PAY";
const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `PAY-<unix millis>-<6 upper-case alphanumerics>`. Uniqueness is enforced
/// by the `payment.reference_code` constraint, not by this generator.
pub fn generate_reference_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("{}-{}-{}", PREFIX, Utc::now().timestamp_millis(), suffix)
}
