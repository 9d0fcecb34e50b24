//! The line codec: stateless translation between [`Message`] values and
//! protocol lines.
//!
//! # Wire layout
//!
//! One message per line. Fields are joined with `|`; inside the
//! variable-length list messages (`PROPOSALS`, `CONTRACTS`) each entry is
//! one `|`-separated segment, and proposal entries use `,` between their
//! sub-fields:
//!
//! ```text
//! STATE|<name>|<money>|<population>|<eProd>|<eCons>|<eFul>|<wProd>|<wCons>|<wFul>|<sProd>|<sCons>|<sFul>|<pingMs>|<paused>|<speed>|<date>|<eBorder>|<wBorder>|<sBorder>
//! PINGREQ|<id>
//! PINGRSP|<id>
//! PROPOSALS|<id>,<seller>,<buyer>,<resource>,<units>,<price>|...
//! CONTRACTS|<entry>|...
//! CONTRACTREQ|<seller>|<buyer>|<resource>|<units>|<price>
//! CONTRACTDECISION|<proposalId>|<player>|<accept>
//! LIST|<raw broker payload>
//! ```
//!
//! Free-text fields (player names, the simulation date, proposal ids,
//! contract entries) are percent-encoded *individually*, so neither `|`
//! nor `,` nor control characters can appear literally and no raw newline
//! survives encoding. Booleans are `0`/`1`.
//!
//! Decoding is strict per line but tolerant per proposal entry: a line
//! that parses into no known shape is an error (the session drops it and
//! keeps reading), while a malformed entry inside a `PROPOSALS` line is
//! skipped with a warning so one bad entry never poisons a snapshot.

use crate::{LocalState, Message, Proposal, ProtocolError, Resource, UtilityStats};

/// Number of `|`-separated segments in a `STATE` line, tag included.
const STATE_SEGMENTS: usize = 20;

/// Number of `,`-separated sub-fields in one proposal entry.
const PROPOSAL_FIELDS: usize = 6;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a message into one protocol line, without the trailing
/// terminator (the framing layer appends it).
pub fn encode(msg: &Message) -> String {
    match msg {
        Message::State(state) => encode_state(state),
        Message::PingRequest { id } => format!("PINGREQ|{id}"),
        Message::PingResponse { id } => format!("PINGRSP|{id}"),
        Message::Proposals(proposals) => {
            let mut line = String::from("PROPOSALS");
            for proposal in proposals {
                line.push('|');
                line.push_str(&encode_proposal_entry(proposal));
            }
            line
        }
        Message::Contracts(contracts) => {
            let mut line = String::from("CONTRACTS");
            for entry in contracts {
                line.push('|');
                line.push_str(&encode_text(entry));
            }
            line
        }
        Message::ContractRequest {
            seller,
            buyer,
            resource,
            units,
            price_per_tick,
        } => format!(
            "CONTRACTREQ|{}|{}|{}|{}|{}",
            encode_text(seller),
            encode_text(buyer),
            resource.code(),
            units,
            price_per_tick,
        ),
        Message::ContractDecision {
            proposal_id,
            player,
            accept,
        } => format!(
            "CONTRACTDECISION|{}|{}|{}",
            encode_text(proposal_id),
            encode_text(player),
            flag(*accept),
        ),
        Message::PlayerList { raw } => {
            if raw.is_empty() {
                String::from("LIST")
            } else {
                format!("LIST|{raw}")
            }
        }
    }
}

fn encode_state(state: &LocalState) -> String {
    let mut line = String::with_capacity(128);
    line.push_str("STATE|");
    // The name is trimmed on the way out so a well-formed snapshot never
    // carries leading/trailing whitespace, whatever the host game hands us.
    line.push_str(&encode_text(state.player_name.trim()));
    for stat in [
        state.money.to_string(),
        state.population.to_string(),
    ] {
        line.push('|');
        line.push_str(&stat);
    }
    for utility in [&state.electricity, &state.water, &state.sewage] {
        for value in [utility.production, utility.consumption, utility.fulfilled] {
            line.push('|');
            line.push_str(&value.to_string());
        }
    }
    line.push('|');
    line.push_str(&state.ping_ms.to_string());
    line.push('|');
    line.push_str(flag(state.paused));
    line.push('|');
    line.push_str(&state.sim_speed.to_string());
    line.push('|');
    line.push_str(&encode_text(&state.sim_date));
    for border in [
        state.electricity_border,
        state.water_border,
        state.sewage_border,
    ] {
        line.push('|');
        line.push_str(flag(border));
    }
    line
}

fn encode_proposal_entry(proposal: &Proposal) -> String {
    format!(
        "{},{},{},{},{},{}",
        encode_text(&proposal.id),
        encode_text(&proposal.seller),
        encode_text(&proposal.buyer),
        proposal.resource.code(),
        proposal.units,
        proposal.price_per_tick,
    )
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes one protocol line into a typed message.
///
/// # Errors
///
/// Returns a [`ProtocolError`] describing the first malformation found.
/// The caller is expected to drop the line and continue; line framing is
/// independent of content validity, so a malformed line never
/// desynchronizes the ones after it.
pub fn decode(line: &str) -> Result<Message, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(ProtocolError::EmptyLine);
    }

    let (tag, _) = line.split_once('|').unwrap_or((line, ""));
    match tag {
        "STATE" => decode_state(line),
        "PINGREQ" => Ok(Message::PingRequest {
            id: decode_ping_id(line)?,
        }),
        "PINGRSP" => Ok(Message::PingResponse {
            id: decode_ping_id(line)?,
        }),
        "PROPOSALS" => Ok(Message::Proposals(decode_proposals(line))),
        "CONTRACTS" => decode_contracts(line),
        "CONTRACTREQ" => decode_contract_request(line),
        "CONTRACTDECISION" => decode_contract_decision(line),
        "LIST" => Ok(Message::PlayerList {
            raw: line.strip_prefix("LIST|").unwrap_or("").to_string(),
        }),
        other => Err(ProtocolError::UnknownTag(other.to_string())),
    }
}

fn decode_state(line: &str) -> Result<Message, ProtocolError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != STATE_SEGMENTS {
        return Err(ProtocolError::FieldCount {
            tag: "STATE",
            expected: STATE_SEGMENTS,
            got: fields.len(),
        });
    }

    let mut utilities = [UtilityStats::default(); 3];
    for (i, utility) in utilities.iter_mut().enumerate() {
        let base = 4 + i * 3;
        utility.production = parse_int("production", fields[base])?;
        utility.consumption = parse_int("consumption", fields[base + 1])?;
        utility.fulfilled = parse_int("fulfilled", fields[base + 2])?;
    }
    let [electricity, water, sewage] = utilities;

    Ok(Message::State(LocalState {
        player_name: decode_text("player name", fields[1])?,
        money: parse_int("money", fields[2])?,
        population: parse_int("population", fields[3])?,
        electricity,
        water,
        sewage,
        ping_ms: parse_int("ping", fields[13])?,
        paused: parse_flag("paused", fields[14])?,
        sim_speed: parse_int("sim speed", fields[15])?,
        sim_date: decode_text("sim date", fields[16])?,
        electricity_border: parse_flag("electricity border", fields[17])?,
        water_border: parse_flag("water border", fields[18])?,
        sewage_border: parse_flag("sewage border", fields[19])?,
    }))
}

fn decode_ping_id(line: &str) -> Result<u64, ProtocolError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 2 {
        return Err(ProtocolError::FieldCount {
            tag: "PINGREQ/PINGRSP",
            expected: 2,
            got: fields.len(),
        });
    }
    parse_int("ping id", fields[1])
}

/// Parses the entries of a `PROPOSALS` line, skipping malformed ones.
///
/// Wholesale-replacement semantics mean a skipped entry simply isn't in
/// this snapshot; the next broadcast carries the authoritative list again.
fn decode_proposals(line: &str) -> Vec<Proposal> {
    let mut proposals = Vec::new();
    for entry in line.split('|').skip(1) {
        if entry.is_empty() {
            continue;
        }
        match decode_proposal_entry(entry) {
            Ok(proposal) => proposals.push(proposal),
            Err(error) => {
                tracing::warn!(%error, entry, "skipping malformed proposal entry");
            }
        }
    }
    proposals
}

fn decode_proposal_entry(entry: &str) -> Result<Proposal, ProtocolError> {
    let fields: Vec<&str> = entry.split(',').collect();
    if fields.len() != PROPOSAL_FIELDS {
        return Err(ProtocolError::FieldCount {
            tag: "PROPOSALS entry",
            expected: PROPOSAL_FIELDS,
            got: fields.len(),
        });
    }

    let id = decode_text("proposal id", fields[0])?;
    if id.is_empty() {
        return Err(ProtocolError::EmptyProposalField("id"));
    }
    let seller = decode_text("seller", fields[1])?;
    if seller.is_empty() {
        return Err(ProtocolError::EmptyProposalField("seller"));
    }

    Ok(Proposal {
        id,
        seller,
        buyer: decode_text("buyer", fields[2])?,
        resource: parse_resource(fields[3])?,
        units: parse_int("units", fields[4])?,
        price_per_tick: parse_int("price", fields[5])?,
    })
}

fn decode_contracts(line: &str) -> Result<Message, ProtocolError> {
    let mut contracts = Vec::new();
    for entry in line.split('|').skip(1) {
        if entry.is_empty() {
            continue;
        }
        contracts.push(decode_text("contract entry", entry)?);
    }
    Ok(Message::Contracts(contracts))
}

fn decode_contract_request(line: &str) -> Result<Message, ProtocolError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 6 {
        return Err(ProtocolError::FieldCount {
            tag: "CONTRACTREQ",
            expected: 6,
            got: fields.len(),
        });
    }
    Ok(Message::ContractRequest {
        seller: decode_text("seller", fields[1])?,
        buyer: decode_text("buyer", fields[2])?,
        resource: parse_resource(fields[3])?,
        units: parse_int("units", fields[4])?,
        price_per_tick: parse_int("price", fields[5])?,
    })
}

fn decode_contract_decision(line: &str) -> Result<Message, ProtocolError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 4 {
        return Err(ProtocolError::FieldCount {
            tag: "CONTRACTDECISION",
            expected: 4,
            got: fields.len(),
        });
    }
    Ok(Message::ContractDecision {
        proposal_id: decode_text("proposal id", fields[1])?,
        player: decode_text("player", fields[2])?,
        accept: parse_flag("accept", fields[3])?,
    })
}

fn parse_int<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ProtocolError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ProtocolError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_resource(value: &str) -> Result<Resource, ProtocolError> {
    let code: u8 = parse_int("resource", value)?;
    Resource::from_code(code)
        .ok_or_else(|| ProtocolError::UnknownResource(value.to_string()))
}

// ---------------------------------------------------------------------------
// Percent-encoding of free-text fields
// ---------------------------------------------------------------------------

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encodes one free-text field.
///
/// Everything outside the unreserved set (`A–Z a–z 0–9 - . _ ~`) becomes
/// `%XX`, which guarantees the delimiters `|` and `,` and all control
/// characters (newlines included) never appear literally in a line.
pub fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
        }
    }
    out
}

/// Percent-decodes one free-text field.
///
/// Strict: a truncated or non-hex escape is a malformed message, not
/// salvageable text, so it fails instead of passing the bytes through.
pub fn decode_text(
    field: &'static str,
    encoded: &str,
) -> Result<String, ProtocolError> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let (Some(&hi), Some(&lo)) = (bytes.get(i + 1), bytes.get(i + 2))
                else {
                    return Err(ProtocolError::BadEscape(field));
                };
                let (Some(hi), Some(lo)) = (decode_hex(hi), decode_hex(lo)) else {
                    return Err(ProtocolError::BadEscape(field));
                };
                out.push((hi << 4) | lo);
                i += 3;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| ProtocolError::BadUtf8(field))
}

fn decode_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================
