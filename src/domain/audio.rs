use serde::{Deserialize, Serialize};

/// Process-wide audio session category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCategory {
    Ambient,
    /// Platform default: playback only, silenced by other audio.
    #[default]
    SoloAmbient,
    Playback,
    Record,
    /// Simultaneous capture and playback, used while recognizing.
    PlayAndRecord,
    MultiRoute,
}

/// Routing options applied together with a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOptions {
    #[default]
    None,
    /// Route output to the built-in speaker instead of the receiver.
    DefaultToSpeaker,
    /// Allow Bluetooth hands-free devices as input and output.
    AllowBluetoothHfp,
}

/// Kind of an audio route endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioPort {
    BuiltInSpeaker,
    BuiltInReceiver,
    BuiltInMic,
    /// Wired headphones or headset.
    Headphones,
    /// Bluetooth output-only profile.
    BluetoothA2dp,
    /// Bluetooth hands-free profile (input and output).
    BluetoothHfp,
    Usb,
    Other,
}

/// Current outputs and available inputs of the audio device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRoute {
    pub outputs: Vec<AudioPort>,
    pub available_inputs: Vec<AudioPort>,
}

impl AudioRoute {
    /// A wired headset or Bluetooth audio output is in use.
    pub fn has_headset_output(&self) -> bool {
        self.outputs
            .iter()
            .any(|p| matches!(p, AudioPort::Headphones | AudioPort::BluetoothA2dp))
    }

    /// A Bluetooth hands-free input is available.
    pub fn has_bluetooth_input(&self) -> bool {
        self.available_inputs.contains(&AudioPort::BluetoothHfp)
    }

    /// Whether recognition should prefer the hands-free Bluetooth route.
    pub fn prefers_hands_free(&self) -> bool {
        self.has_headset_output() || self.has_bluetooth_input()
    }

    /// Options to apply with the recognition category on this route.
    pub fn recognition_options(&self) -> CategoryOptions {
        if self.prefers_hands_free() {
            CategoryOptions::AllowBluetoothHfp
        } else {
            CategoryOptions::DefaultToSpeaker
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_route_defaults_to_speaker() {
        let route = AudioRoute {
            outputs: vec![AudioPort::BuiltInSpeaker],
            available_inputs: vec![AudioPort::BuiltInMic],
        };
        assert!(!route.prefers_hands_free());
        assert_eq!(route.recognition_options(), CategoryOptions::DefaultToSpeaker);
    }

    #[test]
    fn test_headset_routes_prefer_hands_free() {
        let wired = AudioRoute {
            outputs: vec![AudioPort::Headphones],
            available_inputs: vec![AudioPort::BuiltInMic],
        };
        assert_eq!(wired.recognition_options(), CategoryOptions::AllowBluetoothHfp);

        let hfp_only = AudioRoute {
            outputs: vec![AudioPort::BuiltInSpeaker],
            available_inputs: vec![AudioPort::BuiltInMic, AudioPort::BluetoothHfp],
        };
        assert!(hfp_only.has_bluetooth_input());
        assert_eq!(hfp_only.recognition_options(), CategoryOptions::AllowBluetoothHfp);
    }
}
