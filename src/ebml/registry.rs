//! Static registry of known EBML / WebM element ids.
//!
//! Ids are stored as the full on-wire bit pattern (marker included), per
//! the Matroska/WebM element tables.

use super::element::{ElementId, ElementKind};

/// Registered identity of an element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRegister {
    pub id: ElementId,
    pub name: &'static str,
    pub kind: ElementKind,
}

/// Returned for ids not present in the table.
pub const UNKNOWN: ElementRegister = ElementRegister {
    id: 0,
    name: "Unknown",
    kind: ElementKind::Unknown,
};

/// Well-known element ids.
pub mod ids {
    use super::ElementId;

    pub const EBML: ElementId = 0x1A45_DFA3;
    pub const SEGMENT: ElementId = 0x1853_8067;

    pub const SEEK_HEAD: ElementId = 0x114D_9B74;
    pub const SEEK: ElementId = 0x4DBB;
    pub const SEEK_ID: ElementId = 0x53AB;
    pub const SEEK_POSITION: ElementId = 0x53AC;

    pub const INFO: ElementId = 0x1549_A966;
    pub const TIMECODE_SCALE: ElementId = 0x2A_D7B1;
    pub const DURATION: ElementId = 0x4489;

    pub const TRACKS: ElementId = 0x1654_AE6B;
    pub const TRACK_ENTRY: ElementId = 0xAE;
    pub const TRACK_NUMBER: ElementId = 0xD7;
    pub const CODEC_ID: ElementId = 0x86;
    pub const AUDIO: ElementId = 0xE1;
    pub const SAMPLING_FREQUENCY: ElementId = 0xB5;
    pub const CHANNELS: ElementId = 0x9F;

    pub const CUES: ElementId = 0x1C53_BB6B;
    pub const CUE_POINT: ElementId = 0xBB;
    pub const CUE_TIME: ElementId = 0xB3;
    pub const CUE_TRACK_POSITIONS: ElementId = 0xB7;
    pub const CUE_CLUSTER_POSITION: ElementId = 0xF1;

    pub const CLUSTER: ElementId = 0x1F43_B675;
    pub const TIMECODE: ElementId = 0xE7;
    pub const SIMPLE_BLOCK: ElementId = 0xA3;
    pub const BLOCK_GROUP: ElementId = 0xA0;
}

/// Known elements, sorted by id for binary search.
static REGISTERS: &[ElementRegister] = &[
    reg(0x83, "TrackType", ElementKind::UInt),
    reg(ids::CODEC_ID, "CodecID", ElementKind::String),
    reg(0x88, "FlagDefault", ElementKind::UInt),
    reg(0x9B, "BlockDuration", ElementKind::UInt),
    reg(0x9C, "FlagLacing", ElementKind::UInt),
    reg(ids::CHANNELS, "Channels", ElementKind::UInt),
    reg(ids::BLOCK_GROUP, "BlockGroup", ElementKind::Master),
    reg(0xA1, "Block", ElementKind::Binary),
    reg(ids::SIMPLE_BLOCK, "SimpleBlock", ElementKind::Binary),
    reg(0xA7, "Position", ElementKind::UInt),
    reg(0xAB, "PrevSize", ElementKind::UInt),
    reg(ids::TRACK_ENTRY, "TrackEntry", ElementKind::Master),
    reg(ids::CUE_TIME, "CueTime", ElementKind::UInt),
    reg(ids::SAMPLING_FREQUENCY, "SamplingFrequency", ElementKind::Float),
    reg(ids::CUE_TRACK_POSITIONS, "CueTrackPositions", ElementKind::Master),
    reg(0xB9, "FlagEnabled", ElementKind::UInt),
    reg(ids::CUE_POINT, "CuePoint", ElementKind::Master),
    reg(0xBF, "CRC-32", ElementKind::Binary),
    reg(ids::TRACK_NUMBER, "TrackNumber", ElementKind::UInt),
    reg(ids::AUDIO, "Audio", ElementKind::Master),
    reg(ids::TIMECODE, "Timecode", ElementKind::UInt),
    reg(0xEC, "Void", ElementKind::Binary),
    reg(0xF0, "CueRelativePosition", ElementKind::UInt),
    reg(ids::CUE_CLUSTER_POSITION, "CueClusterPosition", ElementKind::UInt),
    reg(0xF7, "CueTrack", ElementKind::UInt),
    reg(0xFB, "ReferenceBlock", ElementKind::Int),
    reg(0x4282, "DocType", ElementKind::String),
    reg(0x4285, "DocTypeReadVersion", ElementKind::UInt),
    reg(0x4286, "EBMLVersion", ElementKind::UInt),
    reg(0x4287, "DocTypeVersion", ElementKind::UInt),
    reg(0x42F2, "EBMLMaxIDLength", ElementKind::UInt),
    reg(0x42F3, "EBMLMaxSizeLength", ElementKind::UInt),
    reg(0x42F7, "EBMLReadVersion", ElementKind::UInt),
    reg(0x4461, "DateUTC", ElementKind::Date),
    reg(0x4487, "TagString", ElementKind::Unicode),
    reg(ids::DURATION, "Duration", ElementKind::Float),
    reg(0x45A3, "TagName", ElementKind::Unicode),
    reg(ids::SEEK, "Seek", ElementKind::Master),
    reg(0x536E, "Name", ElementKind::Unicode),
    reg(0x5378, "CueBlockNumber", ElementKind::UInt),
    reg(ids::SEEK_ID, "SeekID", ElementKind::Binary),
    reg(ids::SEEK_POSITION, "SeekPosition", ElementKind::UInt),
    reg(0x56AA, "CodecDelay", ElementKind::UInt),
    reg(0x56BB, "SeekPreRoll", ElementKind::UInt),
    reg(0x6264, "BitDepth", ElementKind::UInt),
    reg(0x63A2, "CodecPrivate", ElementKind::Binary),
    reg(0x63C0, "Targets", ElementKind::Master),
    reg(0x67C8, "SimpleTag", ElementKind::Master),
    reg(0x7373, "Tag", ElementKind::Master),
    reg(0x73A4, "SegmentUID", ElementKind::Binary),
    reg(0x73C5, "TrackUID", ElementKind::UInt),
    reg(0x75A2, "DiscardPadding", ElementKind::Int),
    reg(0x78B5, "OutputSamplingFrequency", ElementKind::Float),
    reg(0x7BA9, "Title", ElementKind::Unicode),
    reg(0x22B59C, "Language", ElementKind::String),
    reg(0x23E383, "DefaultDuration", ElementKind::UInt),
    reg(ids::TIMECODE_SCALE, "TimecodeScale", ElementKind::UInt),
    reg(ids::SEEK_HEAD, "SeekHead", ElementKind::Master),
    reg(0x1254_C367, "Tags", ElementKind::Master),
    reg(ids::INFO, "Info", ElementKind::Master),
    reg(ids::TRACKS, "Tracks", ElementKind::Master),
    reg(ids::SEGMENT, "Segment", ElementKind::Master),
    reg(ids::EBML, "EBML", ElementKind::Master),
    reg(ids::CUES, "Cues", ElementKind::Master),
    reg(ids::CLUSTER, "Cluster", ElementKind::Master),
];

const fn reg(id: ElementId, name: &'static str, kind: ElementKind) -> ElementRegister {
    ElementRegister { id, name, kind }
}

/// Look up an id; unknown ids map to the [`UNKNOWN`] sentinel.
pub fn lookup(id: ElementId) -> &'static ElementRegister {
    match REGISTERS.binary_search_by_key(&id, |r| r.id) {
        Ok(i) => &REGISTERS[i],
        Err(_) => &UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        for pair in REGISTERS.windows(2) {
            assert!(pair[0].id < pair[1].id, "{} >= {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn lookup_known() {
        assert_eq!(lookup(ids::SEGMENT).name, "Segment");
        assert_eq!(lookup(ids::SIMPLE_BLOCK).kind, ElementKind::Binary);
        assert_eq!(lookup(ids::TIMECODE_SCALE).kind, ElementKind::UInt);
    }

    #[test]
    fn lookup_unknown() {
        let reg = lookup(0xDEAD_BEEF);
        assert_eq!(reg.name, "Unknown");
        assert_eq!(reg.kind, ElementKind::Unknown);
    }
}
