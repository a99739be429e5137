use qrcode::EcLevel;

/// Byte-mode data capacity for every symbol version at each error-correction
/// level, per ISO/IEC 18004. Row `v - 1` holds `[L, M, Q, H]` for version `v`.
/// One authoritative table; no per-call-site magic ceilings.
pub const BYTE_MODE_CAPACITY: [[usize; 4]; 40] = [
    [17, 14, 11, 7],          // 1
    [32, 26, 20, 14],         // 2
    [53, 42, 32, 24],         // 3
    [78, 62, 46, 34],         // 4
    [106, 84, 60, 44],        // 5
    [134, 106, 74, 58],       // 6
    [154, 122, 86, 64],       // 7
    [192, 152, 108, 84],      // 8
    [230, 180, 130, 98],      // 9
    [271, 213, 151, 119],     // 10
    [321, 251, 177, 137],     // 11
    [367, 287, 203, 155],     // 12
    [425, 331, 241, 177],     // 13
    [458, 362, 258, 194],     // 14
    [520, 412, 292, 220],     // 15
    [586, 450, 322, 250],     // 16
    [644, 504, 364, 280],     // 17
    [718, 560, 394, 310],     // 18
    [792, 624, 442, 338],     // 19
    [858, 666, 482, 382],     // 20
    [929, 711, 509, 403],     // 21
    [1003, 779, 565, 439],    // 22
    [1091, 857, 611, 461],    // 23
    [1171, 911, 661, 511],    // 24
    [1273, 997, 715, 535],    // 25
    [1367, 1059, 751, 593],   // 26
    [1465, 1125, 805, 625],   // 27
    [1528, 1190, 868, 658],   // 28
    [1628, 1264, 908, 698],   // 29
    [1732, 1370, 982, 742],   // 30
    [1840, 1452, 1030, 790],  // 31
    [1952, 1538, 1112, 842],  // 32
    [2068, 1628, 1168, 898],  // 33
    [2188, 1722, 1228, 958],  // 34
    [2303, 1809, 1283, 983],  // 35
    [2431, 1911, 1351, 1051], // 36
    [2563, 1989, 1423, 1093], // 37
    [2699, 2099, 1499, 1139], // 38
    [2809, 2213, 1579, 1219], // 39
    [2953, 2331, 1663, 1273], // 40
];

/// Warn (but still proceed) once the payload uses more than this share of the
/// capacity ceiling.
pub const WARN_PERCENT: usize = 80;

/// Outcome of the pre-encode capacity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    /// Over the warn threshold but under the ceiling; carries the message
    /// surfaced to the caller.
    Warn(String),
    /// Over the ceiling; carries the byte overage.
    Reject { overage: usize },
}

fn level_index(level: EcLevel) -> usize {
    match level {
        EcLevel::L => 0,
        EcLevel::M => 1,
        EcLevel::Q => 2,
        EcLevel::H => 3,
    }
}

pub fn level_name(level: EcLevel) -> &'static str {
    match level {
        EcLevel::L => "L",
        EcLevel::M => "M",
        EcLevel::Q => "Q",
        EcLevel::H => "H",
    }
}

/// Byte capacity of one (level, version) cell. `None` outside 1..=40.
pub fn capacity_for(level: EcLevel, version: u8) -> Option<usize> {
    if !(1..=40).contains(&version) {
        return None;
    }
    Some(BYTE_MODE_CAPACITY[version as usize - 1][level_index(level)])
}

/// Capacity of the largest allowed symbol; `max_version` is clamped into
/// the valid 1..=40 range.
pub fn ceiling(level: EcLevel, max_version: u8) -> usize {
    BYTE_MODE_CAPACITY[max_version.clamp(1, 40) as usize - 1][level_index(level)]
}

/// Smallest version (up to `max_version`) whose byte capacity holds
/// `encoded_bytes` at `level`, if any.
pub fn smallest_fitting_version(encoded_bytes: usize, level: EcLevel, max_version: u8) -> Option<u8> {
    (1..=max_version.min(40))
        .find(|&v| capacity_for(level, v).is_some_and(|cap| cap >= encoded_bytes))
}

/// Evaluate the gate. Pure function of its inputs; must run before the
/// symbol encoder so oversized payloads never pay encoder cost.
pub fn evaluate(encoded_bytes: usize, level: EcLevel, max_version: u8) -> Verdict {
    let limit = ceiling(level, max_version);
    if encoded_bytes > limit {
        return Verdict::Reject {
            overage: encoded_bytes - limit,
        };
    }
    if encoded_bytes * 100 > limit * WARN_PERCENT {
        return Verdict::Warn(format!(
            "payload uses {} of {} bytes available at level {} (over {}%); \
             scanning may be unreliable",
            encoded_bytes,
            limit,
            level_name(level),
            WARN_PERCENT,
        ));
    }
    Verdict::Proceed
}

/// Remediation advice attached to capacity rejections.
pub fn remediation_hint(level: EcLevel) -> String {
    match level {
        EcLevel::L => {
            "Reduce the image quality or maximum dimension, or shorten the input.".to_string()
        }
        other => format!(
            "Reduce the image quality or maximum dimension, or drop the \
             error-correction level below {} to gain capacity.",
            level_name(other),
        ),
    }
}
