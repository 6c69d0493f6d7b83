use crate::{PixelCoord, ProtocolError};

/// Encode an estimated position as a control-channel message:
/// `"Coordinates: <x>, <y>"`.
pub fn encode_coordinates(coord: PixelCoord) -> String {
    format!("Coordinates: {}, {}", coord.x, coord.y)
}

/// Parse a control-channel coordinate message.
///
/// The grammar is `"Coordinates: " <int> "," <int>`, where the second
/// integer may carry leading whitespace. The parser locates the first `:`,
/// splits the remainder once on the first `,`, and int-parses both trimmed
/// fields. Anything else is a [`ProtocolError`].
pub fn parse_coordinates(msg: &str) -> Result<PixelCoord, ProtocolError> {
    let malformed = || ProtocolError::MalformedCoordinates(msg.to_string());

    let (_, rest) = msg.split_once(':').ok_or_else(malformed)?;
    let (x, y) = rest.split_once(',').ok_or_else(malformed)?;
    let x = x.trim().parse::<i32>().map_err(|_| malformed())?;
    let y = y.trim().parse::<i32>().map_err(|_| malformed())?;
    Ok(PixelCoord::new(x, y))
}
