//! Recorded perception traces.
//!
//! One record per line, `#` starts a comment:
//!
//! ```text
//! pose,<ms>,<x,y,z per joint>,<u,v per joint>
//! landmarks,<ms>,<x,y,z per landmark>,<u,v per landmark>
//! nopose,<ms>
//! gesture,<ms>,<left>,<right>
//! ```
//!
//! Joints are in [`Joint::ALL`](crate::types::Joint::ALL) order; `landmarks` rows carry the full
//! 33-point body model as the pose recognizer emits it. Gesture labels are `open_palm`,
//! `closed_fist`, `other` or `-` for a hand the recognizer did not see;
//! recognizer category names (`Open_Palm`, `Thumb_Up`, ...) are accepted too.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::types::{
    GestureLabel, HandGestures, PoseSample, Vec2, Vec3, JOINT_COUNT, POSE_LANDMARK_COUNT,
};

const POSE_FIELDS: usize = 2 + JOINT_COUNT * 3 + JOINT_COUNT * 2;
const LANDMARK_FIELDS: usize = 2 + POSE_LANDMARK_COUNT * 3 + POSE_LANDMARK_COUNT * 2;

#[derive(Debug)]
pub enum TraceError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { line: usize, msg: String },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { line, msg } => write!(f, "line {line}: {msg}"),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceRecord {
    Pose(PoseSample),
    NoPose { t_ms: u64 },
    Gesture { t_ms: u64, gestures: HandGestures },
}

impl TraceRecord {
    pub fn t_ms(&self) -> u64 {
        match self {
            Self::Pose(sample) => sample.t_ms,
            Self::NoPose { t_ms } | Self::Gesture { t_ms, .. } => *t_ms,
        }
    }

    /// Pose and no-pose records each drive one control tick.
    pub fn is_tick(&self) -> bool {
        !matches!(self, Self::Gesture { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn from_path(path: &Path) -> Result<Self, TraceError> {
        let raw = fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, TraceError> {
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            records.push(parse_record(trimmed, line_no)?);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn tick_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_tick()).count()
    }

    /// Tick-driving records paired with the gestures in effect at that point.
    pub fn ticks(&self) -> impl Iterator<Item = (u64, Option<PoseSample>, HandGestures)> + '_ {
        let mut gestures = HandGestures::NONE;
        self.records.iter().filter_map(move |record| match *record {
            TraceRecord::Gesture {
                gestures: latest, ..
            } => {
                gestures = latest;
                None
            }
            TraceRecord::Pose(sample) => Some((sample.t_ms, Some(sample), gestures)),
            TraceRecord::NoPose { t_ms } => Some((t_ms, None, gestures)),
        })
    }
}

fn parse_record(line: &str, line_no: usize) -> Result<TraceRecord, TraceError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let err = |msg: String| TraceError::Parse { line: line_no, msg };

    match parts[0] {
        "pose" => {
            if parts.len() != POSE_FIELDS {
                return Err(err(format!(
                    "pose record needs {POSE_FIELDS} fields, got {}",
                    parts.len()
                )));
            }
            let t_ms = parse_ms(parts[1], line_no)?;
            let (world, image) = parse_points(&parts[2..], JOINT_COUNT, line_no)?;
            let mut sample =
                PoseSample::new(t_ms, [Vec3::ZERO; JOINT_COUNT], [Vec2::ZERO; JOINT_COUNT]);
            sample.world.copy_from_slice(&world);
            sample.image.copy_from_slice(&image);
            Ok(TraceRecord::Pose(sample))
        }
        "landmarks" => {
            if parts.len() != LANDMARK_FIELDS {
                return Err(err(format!(
                    "landmarks record needs {LANDMARK_FIELDS} fields, got {}",
                    parts.len()
                )));
            }
            let t_ms = parse_ms(parts[1], line_no)?;
            let (world, image) = parse_points(&parts[2..], POSE_LANDMARK_COUNT, line_no)?;
            PoseSample::from_landmarks(t_ms, &world, &image)
                .map(TraceRecord::Pose)
                .ok_or_else(|| err("incomplete landmark list".to_owned()))
        }
        "nopose" => {
            if parts.len() != 2 {
                return Err(err(format!("nopose record needs 2 fields, got {}", parts.len())));
            }
            Ok(TraceRecord::NoPose {
                t_ms: parse_ms(parts[1], line_no)?,
            })
        }
        "gesture" => {
            if parts.len() != 4 {
                return Err(err(format!("gesture record needs 4 fields, got {}", parts.len())));
            }
            Ok(TraceRecord::Gesture {
                t_ms: parse_ms(parts[1], line_no)?,
                gestures: HandGestures::new(parse_label(parts[2]), parse_label(parts[3])),
            })
        }
        other => Err(err(format!("unknown record kind `{other}`"))),
    }
}

/// `count` world points followed by `count` image points.
fn parse_points(
    fields: &[&str],
    count: usize,
    line_no: usize,
) -> Result<(Vec<Vec3>, Vec<Vec2>), TraceError> {
    let (world_fields, image_fields) = fields.split_at(count * 3);
    let world = world_fields
        .chunks_exact(3)
        .map(|xyz| {
            Ok(Vec3::new(
                parse_coord(xyz[0], line_no)?,
                parse_coord(xyz[1], line_no)?,
                parse_coord(xyz[2], line_no)?,
            ))
        })
        .collect::<Result<Vec<_>, TraceError>>()?;
    let image = image_fields
        .chunks_exact(2)
        .map(|uv| Ok(Vec2::new(parse_coord(uv[0], line_no)?, parse_coord(uv[1], line_no)?)))
        .collect::<Result<Vec<_>, TraceError>>()?;
    Ok((world, image))
}

fn parse_ms(value: &str, line_no: usize) -> Result<u64, TraceError> {
    value.parse().map_err(|_| TraceError::Parse {
        line: line_no,
        msg: format!("invalid timestamp `{value}`"),
    })
}

fn parse_coord(value: &str, line_no: usize) -> Result<f32, TraceError> {
    value.parse().map_err(|_| TraceError::Parse {
        line: line_no,
        msg: format!("invalid coordinate `{value}`"),
    })
}

fn parse_label(value: &str) -> Option<GestureLabel> {
    match value {
        "" | "-" => None,
        name => Some(GestureLabel::from_category(name)),
    }
}

/// Renders a pose as a trace line; the inverse of the `pose` record parser.
pub fn format_pose(sample: &PoseSample) -> String {
    let mut line = format!("pose,{}", sample.t_ms);
    for point in sample.world {
        line.push_str(&format!(",{},{},{}", point.x, point.y, point.z));
    }
    for point in sample.image {
        line.push_str(&format!(",{},{}", point.x, point.y));
    }
    line
}
