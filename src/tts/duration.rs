use std::io::Cursor;

/// Byte rate assumed when the container cannot be read (~16 kbps).
pub const FALLBACK_BYTES_PER_SECOND: f64 = 2000.0;

/// Lower bound for size-based estimates.
pub const MIN_ESTIMATED_DURATION: f64 = 0.5;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("No MPEG audio frame found")]
    NoFrames,
    #[error("ID3v2 tag runs past end of data ({needed} > {available} bytes)")]
    TruncatedTag { needed: usize, available: usize },
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("WAV header declares a zero sample rate")]
    ZeroSampleRate,
}

/// Duration of encoded audio in seconds.
///
/// Reads the container metadata when possible and otherwise falls back to
/// [`estimate_from_size`]. Never fails.
pub fn audio_duration(audio: &[u8]) -> f64 {
    match probe_duration(audio) {
        Ok(duration) => duration,
        Err(e) => {
            log::debug!(
                "Could not read duration from {} bytes of audio ({e}), estimating from size",
                audio.len()
            );
            estimate_from_size(audio.len())
        }
    }
}

/// Byte-rate estimate: `max(len / 2000, 0.5)` seconds.
pub fn estimate_from_size(len: usize) -> f64 {
    (len as f64 / FALLBACK_BYTES_PER_SECOND).max(MIN_ESTIMATED_DURATION)
}

/// Exact duration from container metadata (RIFF/WAV or MPEG audio).
pub fn probe_duration(audio: &[u8]) -> Result<f64, DecodeError> {
    if audio.starts_with(b"RIFF") {
        wav_duration(audio)
    } else {
        mp3_duration(audio)
    }
}

fn wav_duration(audio: &[u8]) -> Result<f64, DecodeError> {
    let reader = hound::WavReader::new(Cursor::new(audio))?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(DecodeError::ZeroSampleRate);
    }
    Ok(reader.duration() as f64 / sample_rate as f64)
}

fn mp3_duration(audio: &[u8]) -> Result<f64, DecodeError> {
    let start = skip_id3v2(audio)?;

    // First header that is followed by another header (or ends the data).
    let (mut pos, first) = (start..audio.len().saturating_sub(3))
        .find_map(|pos| {
            let header = FrameHeader::parse(&audio[pos..])?;
            let next = pos + header.frame_len();
            let confirmed = next == audio.len()
                || audio
                    .get(next..)
                    .and_then(FrameHeader::parse)
                    .is_some();
            confirmed.then_some((pos, header))
        })
        .ok_or(DecodeError::NoFrames)?;

    if pos > start {
        log::debug!("Skipped {} bytes before first MPEG frame", pos - start);
    }

    match vbr_frame_count(audio, pos, &first) {
        VbrInfo::FrameCount(frames) => {
            return Ok(frames as f64 * first.samples() as f64 / first.sample_rate as f64);
        }
        VbrInfo::HeaderOnly => pos += first.frame_len(),
        VbrInfo::Absent => {}
    }

    let mut duration = 0.0;
    while let Some(header) = audio.get(pos..).and_then(FrameHeader::parse) {
        let len = header.frame_len();
        if pos + len > audio.len() {
            break;
        }
        duration += header.duration();
        pos += len;
    }
    Ok(duration)
}

/// Offset of the first byte after an ID3v2 tag, or 0 when there is none.
fn skip_id3v2(audio: &[u8]) -> Result<usize, DecodeError> {
    if !audio.starts_with(b"ID3") {
        return Ok(0);
    }
    if audio.len() < 10 {
        return Err(DecodeError::TruncatedTag {
            needed: 10,
            available: audio.len(),
        });
    }

    // Tag size is a 28-bit syncsafe integer.
    let size = audio[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | (b & 0x7F) as usize);
    let footer = if audio[5] & 0x10 != 0 { 10 } else { 0 };
    let end = 10 + size + footer;
    if end > audio.len() {
        return Err(DecodeError::TruncatedTag {
            needed: end,
            available: audio.len(),
        });
    }
    Ok(end)
}

enum VbrInfo {
    FrameCount(u32),
    HeaderOnly,
    Absent,
}

/// Look for a Xing/Info header inside the first Layer III frame.
fn vbr_frame_count(audio: &[u8], pos: usize, header: &FrameHeader) -> VbrInfo {
    if header.layer != 3 {
        return VbrInfo::Absent;
    }
    let tag_at = pos + 4 + header.side_info_len();
    match audio.get(tag_at..tag_at + 4) {
        Some(b"Xing") | Some(b"Info") => {}
        _ => return VbrInfo::Absent,
    }

    let read_u32 = |at: usize| {
        audio
            .get(at..at + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };
    let flags = read_u32(tag_at + 4).unwrap_or(0);
    match read_u32(tag_at + 8) {
        Some(frames) if flags & 0x1 != 0 && frames > 0 => VbrInfo::FrameCount(frames),
        _ => VbrInfo::HeaderOnly,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    V1,
    V2,
    V25,
}

const BITRATES_V1_L1: [u32; 15] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
];
const BITRATES_V1_L2: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
];
const BITRATES_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];
const BITRATES_V2_L1: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
];
const BITRATES_V2_L23: [u32; 15] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160,
];

/// Decoded 4-byte MPEG audio frame header.
#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    version: MpegVersion,
    layer: u8,
    bitrate_kbps: u32,
    sample_rate: u32,
    padding: bool,
    mono: bool,
}

impl FrameHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0b11 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (bytes[1] >> 1) & 0b11 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };

        // 0 is "free format" and 15 is invalid; neither has a computable length.
        let bitrate_index = (bytes[2] >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let bitrates = match (version, layer) {
            (MpegVersion::V1, 1) => &BITRATES_V1_L1,
            (MpegVersion::V1, 2) => &BITRATES_V1_L2,
            (MpegVersion::V1, _) => &BITRATES_V1_L3,
            (_, 1) => &BITRATES_V2_L1,
            _ => &BITRATES_V2_L23,
        };

        let sample_rates = match version {
            MpegVersion::V1 => [44100, 48000, 32000],
            MpegVersion::V2 => [22050, 24000, 16000],
            MpegVersion::V25 => [11025, 12000, 8000],
        };
        let sample_rate = *sample_rates.get(((bytes[2] >> 2) & 0b11) as usize)?;

        Some(Self {
            version,
            layer,
            bitrate_kbps: bitrates[bitrate_index],
            sample_rate,
            padding: (bytes[2] >> 1) & 1 == 1,
            mono: bytes[3] >> 6 == 0b11,
        })
    }

    fn samples(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (2, _) | (3, MpegVersion::V1) => 1152,
            _ => 576,
        }
    }

    fn frame_len(&self) -> usize {
        let bitrate = self.bitrate_kbps * 1000;
        let padding = self.padding as u32;
        let len = if self.layer == 1 {
            (12 * bitrate / self.sample_rate + padding) * 4
        } else {
            self.samples() / 8 * bitrate / self.sample_rate + padding
        };
        len as usize
    }

    fn side_info_len(&self) -> usize {
        match (self.version == MpegVersion::V1, self.mono) {
            (true, true) => 17,
            (true, false) => 32,
            (false, true) => 9,
            (false, false) => 17,
        }
    }

    fn duration(&self) -> f64 {
        self.samples() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MPEG-1 Layer III, 128 kbps, 44.1 kHz, stereo, no padding.
    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    const FRAME_LEN: usize = 417;
    const FRAME_SECS: f64 = 1152.0 / 44100.0;

    fn cbr_stream(frames: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(frames * FRAME_LEN);
        for _ in 0..frames {
            let mut frame = vec![0u8; FRAME_LEN];
            frame[..4].copy_from_slice(&HEADER);
            data.extend_from_slice(&frame);
        }
        data
    }

    fn id3_tag(body: usize) -> Vec<u8> {
        let mut tag = b"ID3\x04\x00\x00".to_vec();
        tag.extend_from_slice(&[
            ((body >> 21) & 0x7F) as u8,
            ((body >> 14) & 0x7F) as u8,
            ((body >> 7) & 0x7F) as u8,
            (body & 0x7F) as u8,
        ]);
        tag.extend(std::iter::repeat(0u8).take(body));
        tag
    }

    #[test]
    fn small_unknown_payload_uses_floor() {
        assert_eq!(audio_duration(&[]), 0.5);
        assert_eq!(audio_duration(&[0u8; 999]), 0.5);
        assert_eq!(audio_duration(&[7u8; 500]), 0.5);
    }

    #[test]
    fn large_unknown_payload_uses_byte_rate() {
        assert_eq!(audio_duration(&[0u8; 10_000]), 5.0);
        assert!(probe_duration(&[0u8; 10_000]).is_err());
    }

    #[test]
    fn parses_frame_header() {
        let header = FrameHeader::parse(&HEADER).expect("valid header");
        assert_eq!(header.version, MpegVersion::V1);
        assert_eq!(header.layer, 3);
        assert_eq!(header.bitrate_kbps, 128);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.frame_len(), FRAME_LEN);
    }

    #[test]
    fn rejects_free_format_and_reserved_fields() {
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x00, 0x00]).is_none());
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0xF0, 0x00]).is_none());
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x9C, 0x00]).is_none());
        assert!(FrameHeader::parse(&[0xFF, 0xF9, 0x90, 0x00]).is_none());
        assert!(FrameHeader::parse(&[0xFF, 0xF3, 0x90, 0x00]).is_some());
        assert!(FrameHeader::parse(&[0xFF, 0xEB, 0x90, 0x00]).is_none());
    }

    #[test]
    fn sums_cbr_frames() {
        let duration = probe_duration(&cbr_stream(100)).unwrap();
        assert!((duration - 100.0 * FRAME_SECS).abs() < 1e-9);
    }

    #[test]
    fn skips_id3v2_tag() {
        let mut data = id3_tag(300);
        data.extend(cbr_stream(10));
        let duration = audio_duration(&data);
        assert!((duration - 10.0 * FRAME_SECS).abs() < 1e-9);
    }

    #[test]
    fn truncated_tag_falls_back() {
        let mut data = id3_tag(0);
        data[9] = 0x7F;
        assert!(matches!(
            probe_duration(&data),
            Err(DecodeError::TruncatedTag { .. })
        ));
        assert_eq!(audio_duration(&data), 0.5);
    }

    #[test]
    fn ignores_trailing_garbage() {
        let mut data = cbr_stream(20);
        data.extend_from_slice(b"TAG and some trailing metadata");
        let duration = probe_duration(&data).unwrap();
        assert!((duration - 20.0 * FRAME_SECS).abs() < 1e-9);
    }

    #[test]
    fn uses_xing_frame_count() {
        let mut data = cbr_stream(3);
        let tag_at = 4 + 32;
        data[tag_at..tag_at + 4].copy_from_slice(b"Xing");
        data[tag_at + 4..tag_at + 8].copy_from_slice(&1u32.to_be_bytes());
        data[tag_at + 8..tag_at + 12].copy_from_slice(&500u32.to_be_bytes());

        let duration = probe_duration(&data).unwrap();
        assert!((duration - 500.0 * FRAME_SECS).abs() < 1e-9);
    }

    #[test]
    fn info_header_without_count_is_skipped() {
        let mut data = cbr_stream(5);
        data[36..40].copy_from_slice(b"Info");

        let duration = probe_duration(&data).unwrap();
        assert!((duration - 4.0 * FRAME_SECS).abs() < 1e-9);
    }

    #[test]
    fn reads_wav_duration() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..24000 {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let duration = audio_duration(cursor.get_ref());
        assert!((duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn corrupt_wav_falls_back() {
        let mut data = b"RIFF".to_vec();
        data.extend(std::iter::repeat(0u8).take(5996));
        assert_eq!(audio_duration(&data), 3.0);
    }
}
