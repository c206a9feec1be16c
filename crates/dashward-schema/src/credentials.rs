use rand::Rng;

/// Length of passwords generated when `setup` is given none.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random password of `len` alphanumeric characters.
///
/// Draws from `thread_rng`, an OS-seeded CSPRNG, so two calls never share a
/// sequence. 16 characters over 62 symbols is ~95 bits of entropy.
pub fn generate_password(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            char::from(CHARSET[idx])
        })
        .collect()
}
