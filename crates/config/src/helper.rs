//! Compile time parsing of configuration values.
//!
//! Everything here is `const`, the values end up in `const` items of the configuration crate.

// ——————————————————————————————— Booleans ————————————————————————————————— //

/// Returns true unless the variable is explicitly set to "false".
#[macro_export]
macro_rules! is_enabled {
    ($env_var: tt) => {
        match option_env!($env_var) {
            Some(env_var) => !$crate::helper::str_eq(env_var, "false"),
            None => true,
        }
    };
}

/// Returns true only if the variable is explicitly set to "true".
#[macro_export]
macro_rules! is_enabled_default_false {
    ($env_var: tt) => {
        match option_env!($env_var) {
            Some(env_var) => $crate::helper::str_eq(env_var, "true"),
            None => false,
        }
    };
}

/// String equality usable in const contexts.
pub const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }

    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

// ———————————————————————————————— Integers ———————————————————————————————— //

/// Parses a decimal or `0x` prefixed hexadecimal integer.
pub const fn parse_usize(env_var: Option<&str>) -> Option<usize> {
    let bytes = match env_var {
        Some(value) => value.as_bytes(),
        None => return None,
    };

    let (radix, mut i) = if bytes.len() > 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X')
    {
        (16, 2)
    } else {
        (10, 0)
    };

    if i == bytes.len() {
        panic!("Empty integer in configuration");
    }

    let mut value: usize = 0;
    while i < bytes.len() {
        let digit = match bytes[i] {
            b'0'..=b'9' => (bytes[i] - b'0') as usize,
            b'a'..=b'f' if radix == 16 => (bytes[i] - b'a' + 10) as usize,
            b'A'..=b'F' if radix == 16 => (bytes[i] - b'A' + 10) as usize,
            b'_' => {
                i += 1;
                continue;
            }
            _ => panic!("Failed to parse integer from configuration"),
        };
        value = match value.checked_mul(radix) {
            Some(v) => match v.checked_add(digit) {
                Some(v) => v,
                None => panic!("Integer overflow in configuration"),
            },
            None => panic!("Integer overflow in configuration"),
        };
        i += 1;
    }

    Some(value)
}

pub const fn parse_usize_or(env_var: Option<&str>, default: usize) -> usize {
    match parse_usize(env_var) {
        Some(value) => value,
        None => default,
    }
}

// ———————————————————————————————— Strings ————————————————————————————————— //

/// Returns the number of elements of a comma separated list.
pub const fn str_list_len(env_var: Option<&str>) -> usize {
    let bytes = match env_var {
        Some(var) => var.as_bytes(),
        None => return 0,
    };

    let mut len = 1;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b',' {
            len += 1;
        }
        i += 1;
    }
    len
}

/// Splits a comma separated list into string slices.
///
/// `LEN` must be the value returned by [str_list_len] for the same input.
pub const fn parse_str_list<const LEN: usize>(env_var: Option<&str>) -> [&str; LEN] {
    let mut res: [&str; LEN] = [""; LEN];
    let bytes = match env_var {
        Some(var) => var.as_bytes(),
        None => return res,
    };

    let mut start = 0;
    let mut n = 0;
    while n < LEN {
        let mut end = start;
        while end < bytes.len() && bytes[end] != b',' {
            end += 1;
        }

        // Range indexing is not const yet, split twice instead.
        let (_, tail) = bytes.split_at(start);
        let (item, _) = tail.split_at(end - start);
        res[n] = match core::str::from_utf8(item) {
            Ok(item) => item,
            Err(_) => panic!("Invalid string list in configuration"),
        };

        start = end + 1;
        n += 1;
    }

    res
}

// ————————————————————————————————— Tests —————————————————————————————————— //
