//! Serialize/parse round trips over the element tree.

use std::io::Cursor;

use iab::process::parse::Parser;
use iab::structs::bed::{BedChannel, BedDefinition, BedRemap, BedRemapSubBlock, RemapCoeffs};
use iab::structs::element::Element;
use iab::structs::essence::{AudioDataDlc, AudioDataPcm};
use iab::structs::frame::Frame;
use iab::structs::object::{ObjectDefinition, ObjectSubBlock, ObjectZoneDefinition19, Zone19SubBlock};
use iab::structs::types::{
    AudioDescription, BitDepth, ChannelId, DecorCoef, FrameRate, Gain, ObjectZoneGains9, Position,
    SampleRate, Snap, Spread, UseCase,
};
use iab::structs::userdata::{AuthoringToolInfo, UserData};
use iab::utils::bitstream_io::BitstreamIoWriter;
use iab::validate::{ConstraintSet, ErrorCode};

const SMPTE_LABEL: [u8; 16] = [
    0x06, 0x0E, 0x2B, 0x34, 0x04, 0x01, 0x01, 0x0D, 0x04, 0x02, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00,
];

fn rich_bed() -> BedDefinition {
    let mut bed = BedDefinition::new(1);
    bed.conditional = true;
    bed.use_case = Some(UseCase::Case7_1Ds);
    bed.channels = vec![
        BedChannel {
            channel_id: ChannelId::Left,
            audio_data_id: 1,
            gain: Gain::InStream(300),
            decor: Some(DecorCoef::InStream(40)),
        },
        BedChannel {
            channel_id: ChannelId::Right,
            audio_data_id: 2,
            gain: Gain::Silence,
            decor: None,
        },
        BedChannel {
            channel_id: ChannelId::Lfe,
            audio_data_id: 3,
            gain: Gain::Unity,
            decor: Some(DecorCoef::MaxDecor),
        },
    ];
    bed.audio_description = AudioDescription {
        code: 0x81,
        text: b"dialog-stem".to_vec(),
    };

    let mut remap = BedRemap::new(10, UseCase::Case5_1);
    remap.source_channels = 3;
    remap.destination_channels = 2;
    remap.sub_blocks = (0..FrameRate::Fps24.sub_block_count())
        .map(|index| {
            if index == 0 {
                BedRemapSubBlock {
                    remap_info_exists: true,
                    coeffs: vec![
                        RemapCoeffs {
                            dest_channel_id: ChannelId::Left,
                            gains: vec![Gain::Unity, Gain::Silence, Gain::InStream(512)],
                        },
                        RemapCoeffs {
                            dest_channel_id: ChannelId::Right,
                            gains: vec![Gain::Silence, Gain::Unity, Gain::InStream(7)],
                        },
                    ],
                }
            } else {
                BedRemapSubBlock {
                    remap_info_exists: false,
                    coeffs: Vec::new(),
                }
            }
        })
        .collect();

    bed.add_sub_element(Element::BedRemap(remap)).unwrap();
    bed
}

fn rich_object() -> ObjectDefinition {
    let mut object = ObjectDefinition::with_sub_blocks(2, 4, FrameRate::Fps24);
    object.conditional = true;
    object.use_case = Some(UseCase::Always);

    object.pan_sub_blocks[0] = ObjectSubBlock {
        pan_info_exists: true,
        gain: Gain::InStream(123),
        position: Position { x: 1, y: 2, z: 3 },
        snap: Snap {
            present: true,
            tol_exists: true,
            tolerance: 55,
        },
        zone_gains: ObjectZoneGains9 {
            control: true,
            gains: [
                Gain::Unity,
                Gain::Silence,
                Gain::InStream(100),
                Gain::Unity,
                Gain::Unity,
                Gain::Silence,
                Gain::Unity,
                Gain::Unity,
                Gain::Unity,
            ],
        },
        spread: Spread::HighRes3d {
            x: 4000,
            y: 1,
            z: 2048,
        },
        decor: DecorCoef::InStream(9),
    };

    object.pan_sub_blocks[4] = ObjectSubBlock {
        pan_info_exists: true,
        gain: Gain::Unity,
        position: Position {
            x: 65535,
            y: 0,
            z: 32768,
        },
        snap: Snap {
            present: true,
            tol_exists: false,
            tolerance: 0,
        },
        zone_gains: ObjectZoneGains9::default(),
        spread: Spread::HighRes1d(2000),
        decor: DecorCoef::NoDecor,
    };

    let mut zone19 = ObjectZoneDefinition19::new();
    zone19.sub_blocks = (0..FrameRate::Fps24.sub_block_count())
        .map(|index| {
            let mut sub_block = Zone19SubBlock {
                zone19_info_exists: index == 0,
                ..Default::default()
            };
            if index == 0 {
                sub_block.gains[3] = Gain::Silence;
                sub_block.gains[17] = Gain::InStream(511);
            }
            sub_block
        })
        .collect();

    object
        .add_sub_element(Element::ObjectZoneDefinition19(zone19))
        .unwrap();
    object
}

fn rich_frame() -> Frame {
    let mut frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit24, FrameRate::Fps24);
    frame.max_rendered = 300;

    frame
        .add_sub_element(Element::BedDefinition(rich_bed()))
        .unwrap();
    frame
        .add_sub_element(Element::ObjectDefinition(rich_object()))
        .unwrap();

    let mut dlc = AudioDataDlc::new(4, SampleRate::Fs48000);
    dlc.dlc_data = (0u16..512).map(|i| (i % 251) as u8).collect();
    frame.add_sub_element(Element::AudioDataDlc(dlc)).unwrap();

    let mut pcm = AudioDataPcm::silence(5, FrameRate::Fps24, SampleRate::Fs48000, BitDepth::Bit24);
    pcm.samples[0] = 0x12_34_56_00u32 as i32;
    pcm.samples[1999] = i32::MIN;
    frame.add_sub_element(Element::AudioDataPcm(pcm)).unwrap();

    frame
        .add_sub_element(Element::AuthoringToolInfo(AuthoringToolInfo::new(
            b"https://example.com/authoring-tool/2.1".to_vec(),
        )))
        .unwrap();
    frame
        .add_sub_element(Element::UserData(UserData::new(
            SMPTE_LABEL,
            vec![0xDE, 0xAD, 0xBE, 0xEF],
        )))
        .unwrap();

    frame
}

fn serialize_stream(frame: &Frame, preamble: &[u8]) -> Vec<u8> {
    let mut writer = BitstreamIoWriter::new();
    frame.write_sub_frame(&mut writer, preamble).unwrap();
    writer.into_bytes().unwrap()
}

#[test]
fn parse_after_serialize_preserves_the_tree() {
    let frame = rich_frame();
    let bytes = serialize_stream(&frame, &[0xAA, 0xBB, 0xCC, 0xDD]);

    let mut parser = Parser::new_streaming(Cursor::new(bytes)).unwrap();
    parser.parse_frame().unwrap();

    assert_eq!(parser.get_frame().unwrap(), &frame);
}

#[test]
fn serialize_after_parse_is_byte_identical() {
    let frame = rich_frame();
    let first = serialize_stream(&frame, &[]);

    let mut parser = Parser::new_streaming(Cursor::new(first.clone())).unwrap();
    parser.parse_frame().unwrap();
    let reparsed = parser.release_frame().unwrap();

    let second = serialize_stream(&reparsed, &[]);
    assert_eq!(second, first);
}

#[test]
fn buffered_and_streaming_trees_agree() {
    let frame = rich_frame();
    let bytes = serialize_stream(&frame, &[0x55; 8]);

    let mut streaming = Parser::new_streaming(Cursor::new(bytes.clone())).unwrap();
    streaming.parse_frame().unwrap();

    let mut buffered = Parser::new_buffered();
    buffered.parse_frame_buffer(&bytes).unwrap();

    assert_eq!(
        streaming.get_frame().unwrap(),
        buffered.get_frame().unwrap()
    );
}

#[test]
fn packing_disabled_elements_are_not_emitted() {
    let mut frame = rich_frame();
    let total = frame.sub_element_count();

    // Disable the PCM element; the tree keeps it, the wire drops it.
    for element in frame.sub_elements_mut() {
        if matches!(element, Element::AudioDataPcm(_)) {
            element.set_packing_enabled(false);
        }
    }
    assert_eq!(frame.sub_element_count(), total);

    let bytes = serialize_stream(&frame, &[]);
    let mut parser = Parser::new_streaming(Cursor::new(bytes)).unwrap();
    parser.parse_frame().unwrap();

    let parsed = parser.get_frame().unwrap();
    assert_eq!(parsed.sub_element_count(), total - 1);
    assert!(
        !parsed
            .sub_elements()
            .iter()
            .any(|e| matches!(e, Element::AudioDataPcm(_)))
    );
}

#[test]
fn dlc_assets_decode_through_the_codec_oracle() {
    use iab::dlc::{DlcCodec, PassthroughCodec};

    let codec = PassthroughCodec;
    let samples: Vec<i32> = (0..400).map(|i| i * 1000).collect();

    let mut frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit24, FrameRate::Fps120);
    let mut dlc = AudioDataDlc::new(6, SampleRate::Fs48000);
    dlc.dlc_data = codec.encode(&samples, SampleRate::Fs48000).unwrap();
    frame.add_sub_element(Element::AudioDataDlc(dlc)).unwrap();

    let bytes = serialize_stream(&frame, &[]);
    let mut parser = Parser::new_streaming(Cursor::new(bytes)).unwrap();
    parser.parse_frame().unwrap();

    assert_eq!(parser.frame_sample_count(), Some(400));
    let decoded = parser.audio_asset_from_dlc(6, &codec).unwrap();
    assert_eq!(decoded, samples);
    assert!(parser.audio_asset_from_dlc(7, &codec).is_err());
}

#[test]
fn unknown_elements_are_skipped_and_counted() {
    // Hand-pack a frame whose only child uses a reserved element ID.
    let mut body = BitstreamIoWriter::new();
    body.put_n(8, 1u32).unwrap(); // version
    body.put_n(2, 0u32).unwrap(); // 48 kHz
    body.put_n(2, 1u32).unwrap(); // 24 bit
    body.put_n(4, 1u32).unwrap(); // 24 fps
    body.put_plex(8, 0).unwrap(); // max rendered
    body.put_plex(8, 1).unwrap(); // one sub-element
    body.put_plex(8, 0x200).unwrap(); // reserved element ID
    body.put_packed_length(3).unwrap();
    body.put_bytes(&[0x01, 0x02, 0x03]).unwrap();
    let body_bytes = body.into_bytes().unwrap();

    let mut element = BitstreamIoWriter::new();
    element.put_plex(8, 0x08).unwrap();
    element.put_packed_length(body_bytes.len() as u32).unwrap();
    element.put_bytes(&body_bytes).unwrap();
    let element_bytes = element.into_bytes().unwrap();

    let mut stream = BitstreamIoWriter::new();
    stream.put_n(8, 0x01u32).unwrap();
    stream.put_n(32, 0u32).unwrap();
    stream.put_n(8, 0x02u32).unwrap();
    stream.put_n(32, element_bytes.len() as u32).unwrap();
    stream.put_bytes(&element_bytes).unwrap();
    let bytes = stream.into_bytes().unwrap();

    let mut parser = Parser::new_streaming(Cursor::new(bytes)).unwrap();
    parser.parse_frame().unwrap();

    let frame = parser.get_frame().unwrap();
    assert_eq!(frame.num_undefined_sub_elements, 1);
    assert_eq!(frame.sub_element_count(), 0);
    assert_eq!(parser.unallowed_sub_element_count(), 1);

    // Undefined elements are a warning for the base sets and an error for
    // the stricter ones.
    let mut validator = iab::process::validate::Validator::new();
    validator.validate_frame(frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::FrameContainUndefinedSubElement)
    );
    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt429_18_2019)
            .iter()
            .any(|i| i.code == ErrorCode::FrameUndefinedElementType)
    );
}
