//! Marketplace API request signing
//!
//! Signature = uppercase hex MD5 of `secret + k1 + v1 + k2 + v2 + … + secret`
//! with parameters in ascending key order.

use std::collections::BTreeMap;

/// Sign a parameter set with the application secret
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut payload = String::with_capacity(
        secret.len() * 2 + params.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>(),
    );
    payload.push_str(secret);
    for (key, value) in params {
        payload.push_str(key);
        payload.push_str(value);
    }
    payload.push_str(secret);

    format!("{:X}", md5::compute(payload.as_bytes()))
}
