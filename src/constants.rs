use std::sync::LazyLock;

pub mod version;

pub static STARTUP_TIME: LazyLock<std::time::SystemTime> =
    LazyLock::new(std::time::SystemTime::now);

/// Quotes inserted by `SEED_QUOTES` into an empty store: (author, text, rating).
pub const DEFAULT_QUOTES: [(&str, &str, i64); 4] = [
    (
        "Rick Cook",
        "Programming today is a race between software engineers striving to build bigger and better idiot-proof programs, and the Universe trying to produce bigger and better idiots. So far, the Universe is winning.",
        4,
    ),
    (
        "Waldi Ravens",
        "Programming in C is like a fast dance on a newly waxed dance floor by people carrying razors.",
        3,
    ),
    (
        "Mosher's Law of Software Engineering",
        "Don't worry if it doesn't work right. If everything did, you'd be out of a job.",
        5,
    ),
    (
        "Yogi Berra",
        "In theory, there is no difference between theory and practice. In practice, there is.",
        5,
    ),
];
