//! Signature descrambling.
//!
//! Media URLs without a plain `url` carry a scrambled signature that the
//! player script unscrambles with a small helper object of three
//! primitives. The helper methods are mined from the script once and the
//! resulting operation list is cached for the whole process.

use std::collections::HashMap;

use parking_lot::Mutex;
use regex::Regex;

use crate::common::types::AnyResult;

/// One step of the descramble routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScramblerOp {
    /// Drop the first `k mod len` characters.
    Slice(i64),
    /// Swap the characters at positions `0` and `k mod len`.
    Swap(i64),
    /// Reverse the string.
    Reverse,
}

static OPERATIONS: Mutex<Vec<ScramblerOp>> = Mutex::new(Vec::new());

/// Process-wide operation cache; `fetch_script` runs only on the first
/// call.
pub fn cached_operations(
    fetch_script: impl FnOnce() -> AnyResult<String>,
) -> AnyResult<Vec<ScramblerOp>> {
    let mut cache = OPERATIONS.lock();
    if cache.is_empty() {
        let script = fetch_script()?;
        *cache = mine_operations(&script)?;
    }
    Ok(cache.clone())
}

/// Extract the ordered descramble operations from a player script.
///
/// The descramble function splits the signature, applies helper calls and
/// rejoins it. Each helper is classified by shape: a single-parameter body
/// reverses, a body using `splice`/`slice` drops a prefix, the remaining
/// `var c = a[0]`-style body swaps.
pub fn mine_operations(player_js: &str) -> AnyResult<Vec<ScramblerOp>> {
    let body_regex = Regex::new(
        r#"[\w$]+=function\([\w$]+\)\{[\w$]+=[\w$]+\.split\(""\);(.*?;)return\s+[\w$]+\.join\(""\)\}"#,
    )?;
    let body = body_regex
        .captures(player_js)
        .and_then(|caps| caps.get(1))
        .ok_or("descramble function not found in player script")?
        .as_str();

    let object_regex = Regex::new(r#"([\w$]+)(?:\.[\w$]+|\["?[\w$]+"?\])\([\w$]+,\d+\)"#)?;
    let object = object_regex
        .captures(body)
        .and_then(|caps| caps.get(1))
        .ok_or("helper object not referenced in descramble body")?
        .as_str();

    let definition_regex = Regex::new(&format!(
        r#"(?s)var\s+{}=\{{(.*?)\}};"#,
        regex::escape(object)
    ))?;
    let definition = definition_regex
        .captures(player_js)
        .and_then(|caps| caps.get(1))
        .ok_or("helper object definition not found in player script")?
        .as_str();

    let method_regex = Regex::new(r#"([\w$]+):function\(([\w$,\s]*)\)\{([^}]*)\}"#)?;
    let mut methods: HashMap<String, (String, String)> = HashMap::new();
    for caps in method_regex.captures_iter(definition) {
        methods.insert(
            caps[1].to_string(),
            (caps[2].to_string(), caps[3].to_string()),
        );
    }

    let call_regex = Regex::new(r#"[\w$]+(?:\.|\[")([\w$]+)"?\]?\([\w$]+,(\d+)\)"#)?;
    let mut operations = Vec::new();
    for statement in body.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        let caps = call_regex
            .captures(statement)
            .ok_or_else(|| format!("unrecognized descramble statement: {}", statement))?;
        let name = &caps[1];
        let index: i64 = caps[2].parse()?;
        let (params, method_body) = methods
            .get(name)
            .ok_or_else(|| format!("unknown helper method: {}", name))?;

        let single_param = params.split(',').filter(|p| !p.trim().is_empty()).count() == 1;
        let operation = if single_param {
            ScramblerOp::Reverse
        } else if method_body.contains("splice") || method_body.contains("slice") {
            ScramblerOp::Slice(index)
        } else {
            ScramblerOp::Swap(index)
        };
        operations.push(operation);
    }

    if operations.is_empty() {
        return Err("descramble body contains no operations".into());
    }
    Ok(operations)
}

/// Apply the mined operations to a scrambled signature.
pub fn descramble(operations: &[ScramblerOp], signature: &str) -> String {
    let mut chars: Vec<char> = signature.chars().collect();

    for operation in operations {
        if chars.is_empty() {
            break;
        }
        match *operation {
            ScramblerOp::Slice(k) => {
                let index = k.rem_euclid(chars.len() as i64) as usize;
                chars.drain(..index);
            }
            ScramblerOp::Swap(k) => {
                let index = k.rem_euclid(chars.len() as i64) as usize;
                chars.swap(0, index);
            }
            ScramblerOp::Reverse => chars.reverse(),
        }
    }

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_SNIPPET: &str = concat!(
        r#"var Nv={xK:function(a){a.reverse()},"#,
        r#"dU:function(a,b){a.splice(0,b)},"#,
        r#"Gx:function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}};"#,
        "\n",
        r#"var zx=function(a){a=a.split("");Nv.dU(a,2);Nv.xK(a,35);Nv.Gx(a,3);return a.join("")};"#,
    );

    #[test]
    fn mines_operations_in_order() {
        let operations = mine_operations(PLAYER_SNIPPET).unwrap();
        assert_eq!(
            operations,
            vec![
                ScramblerOp::Slice(2),
                ScramblerOp::Reverse,
                ScramblerOp::Swap(3)
            ]
        );
    }

    #[test]
    fn mining_rejects_scripts_without_descrambler() {
        assert!(mine_operations("var player = {};").is_err());
    }

    #[test]
    fn descramble_steps() {
        assert_eq!(descramble(&[ScramblerOp::Slice(2)], "abcdefg"), "cdefg");
        assert_eq!(descramble(&[ScramblerOp::Reverse], "cdefg"), "gfedc");
        assert_eq!(descramble(&[ScramblerOp::Swap(3)], "gfedc"), "dfegc");
        assert_eq!(
            descramble(
                &[ScramblerOp::Slice(2), ScramblerOp::Reverse, ScramblerOp::Swap(3)],
                "abcdefg"
            ),
            "dfegc"
        );
    }

    #[test]
    fn indices_wrap_modulo_length() {
        assert_eq!(descramble(&[ScramblerOp::Slice(12)], "abcde"), "cde");
        assert_eq!(descramble(&[ScramblerOp::Swap(7)], "abcde"), "cbade");
    }

    #[test]
    fn descramble_is_pure() {
        let operations = [
            ScramblerOp::Swap(26),
            ScramblerOp::Reverse,
            ScramblerOp::Slice(3),
        ];
        let first = descramble(&operations, "0123456789abcdef");
        let second = descramble(&operations, "0123456789abcdef");
        assert_eq!(first, second);
    }

    #[test]
    fn mined_operations_descramble_like_the_script() {
        // The snippet's function: splice off 2, reverse, swap 0 <-> 3.
        let operations = mine_operations(PLAYER_SNIPPET).unwrap();
        assert_eq!(descramble(&operations, "abcdefg"), "dfegc");
    }
}
