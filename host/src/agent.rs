//! Agent side of the pipe protocol: read `(field, team, player)` triples,
//! answer each with one action name or `null`.

use std::io::{Read, Write};

use foodfight_core::{FieldState, Symbol};
use serde::de::DeserializeOwned;
use serde_json::de::IoRead;
use tracing::{debug, warn};

use crate::controller::{Controller, ControllerError};

fn read_value<T, R>(
    de: &mut serde_json::Deserializer<IoRead<R>>,
) -> Result<Option<T>, ControllerError>
where
    T: DeserializeOwned,
    R: Read,
{
    match T::deserialize(de) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_eof() => Ok(None),
        Err(e) => Err(ControllerError::Json(e)),
    }
}

/// Serve requests until the engine closes the stream. Returns how many were
/// answered. A controller error is answered with `null`.
pub fn serve<C, R, W>(
    controller: &mut C,
    reader: R,
    mut writer: W,
) -> Result<usize, ControllerError>
where
    C: Controller + ?Sized,
    R: Read,
    W: Write,
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    let mut served = 0;

    loop {
        let Some(field) = read_value::<FieldState, _>(&mut de)? else {
            break;
        };
        let (Some(team), Some(player)) = (
            read_value::<Symbol, _>(&mut de)?,
            read_value::<Symbol, _>(&mut de)?,
        ) else {
            return Err(ControllerError::Closed);
        };

        let action = match controller.play_action(&field, team, player) {
            Ok(action) => action,
            Err(e) => {
                warn!(turn = field.turn, %player, error = %e, "controller failed, answering null");
                None
            }
        };
        serde_json::to_writer(&mut writer, &action.map(|a| a.name()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        served += 1;
    }

    debug!(served, "engine closed the stream");
    Ok(served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::{IdleController, ScriptedController};
    use foodfight_core::{encode_field, generate_field, seeded, Action, MatchConfig};

    fn request(field: &FieldState, team: char, player: char) -> String {
        format!("{}\n\"{team}\"\n\"{player}\"\n", encode_field(field).unwrap())
    }

    #[test]
    fn answers_each_request() {
        let field = generate_field(&MatchConfig::default(), &mut seeded(1));
        let input = format!("{}{}", request(&field, 'A', 'a'), request(&field, 'B', 'b'));
        let mut bot = ScriptedController::new(vec![Some(Action::TurnLeft), None]);
        let mut out = Vec::new();
        let served = serve(&mut bot, input.as_bytes(), &mut out).unwrap();
        assert_eq!(served, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "\"TURN_LEFT\"\nnull\n");
    }

    #[test]
    fn empty_input_serves_nothing() {
        let mut out = Vec::new();
        assert_eq!(serve(&mut IdleController, "".as_bytes(), &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_request_is_an_error() {
        let field = generate_field(&MatchConfig::default(), &mut seeded(1));
        let input = format!("{}\n\"A\"\n", encode_field(&field).unwrap());
        let mut out = Vec::new();
        assert!(matches!(
            serve(&mut IdleController, input.as_bytes(), &mut out),
            Err(ControllerError::Closed)
        ));
    }
}
