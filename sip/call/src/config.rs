use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Configuration of a [`CallSession`](crate::CallSession)
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Address written into the SDP origin and session level connection field
    ///
    /// Default: `127.0.0.1`
    pub local_address: IpAddr,

    /// SDP session name (`s=`)
    ///
    /// Default: `-`
    pub session_name: String,

    /// How long a single DTMF tone is played
    ///
    /// Default: 250ms
    pub dtmf_tone_duration: Duration,

    /// Length of a pause (`p`, `P` or `,`) inside a tone string
    ///
    /// Default: 3s
    pub dtmf_pause_duration: Duration,

    /// Tones played on the first audio content once the call becomes active
    pub initial_tones: Option<String>,

    /// Write the local ICE candidates into generated SDP
    ///
    /// Default: false
    pub offer_candidates: bool,

    /// Range of the re-INVITE retry interval after a glare (491), used when the call's Call-ID was
    /// generated locally
    ///
    /// Default: 2.1s - 4s
    pub glare_owner_interval: RangeInclusive<Duration>,

    /// Range of the re-INVITE retry interval after a glare (491), used when the peer owns the
    /// Call-ID
    ///
    /// Default: 0s - 2s
    pub glare_non_owner_interval: RangeInclusive<Duration>,

    /// Capacity of the command channel of a spawned call
    ///
    /// Default: 32
    pub command_buffer: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            local_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            session_name: "-".into(),
            dtmf_tone_duration: Duration::from_millis(250),
            dtmf_pause_duration: Duration::from_secs(3),
            initial_tones: None,
            offer_candidates: false,
            glare_owner_interval: Duration::from_millis(2100)..=Duration::from_millis(4000),
            glare_non_owner_interval: Duration::ZERO..=Duration::from_millis(2000),
            command_buffer: 32,
        }
    }
}
