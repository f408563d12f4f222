/*!
Parser for hex dumps given on the command line or in `--inhex` files.

Bytes are pairs of hex digits, optionally prefixed with `0x`; they can be separated by whitespace or commas, or not separated at all. `#` starts a comment that lasts till the end of the line.
*/

use nom::{
	IResult,
	branch::alt,
	bytes::complete::{tag, tag_no_case, take_while_m_n},
	character::complete::{multispace1, not_line_ending},
	combinator::{all_consuming, map, map_res, opt, value},
	multi::many0,
	sequence::preceded,
};

fn byte(input: &str) -> IResult<&str, u8> {
	preceded(
		opt(tag_no_case("0x")),
		map_res(
			take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
			|s| u8::from_str_radix(s, 16),
		),
	)(input)
}

fn separator(input: &str) -> IResult<&str, ()> {
	alt((
		value((), multispace1),
		value((), tag(",")),
		value((), preceded(tag("#"), not_line_ending)),
	))(input)
}

fn token(input: &str) -> IResult<&str, Option<u8>> {
	alt((
		map(byte, Some),
		value(None, separator),
	))(input)
}

pub fn parse(input: &str) -> Result<Vec<u8>, String> {
	match all_consuming(many0(token))(input) {
		Ok((_, tokens)) => Ok(tokens.into_iter().flatten().collect()),
		Err(nom::Err::Error((rest, _))) | Err(nom::Err::Failure((rest, _))) => {
			let offset = input.len() - rest.len();
			let context: String = rest.chars().take(16).collect();
			Err(format!("invalid hex at offset {}: {:?}", offset, context))
		},
		Err(nom::Err::Incomplete(_)) => Err("unexpected end of hex input".to_string()),
	}
}

/// Parses integer argument, either decimal or `0x`-prefixed hex
pub fn parse_int(s: &str) -> Result<u64, String> {
	let res = if s.starts_with("0x") || s.starts_with("0X") {
		u64::from_str_radix(&s[2..], 16)
	} else {
		s.parse()
	};
	res.map_err(|e| format!("{}: {}", s, e))
}
