//! Animation tables
//!
//! An animation file nests one `<Table>` per joint inside a
//! `<Table> "<skeleton>"` block. Each joint table may hold an `<Xfm$Anim_S$>`
//! block with the joint's channels plus child joint tables. Joints are
//! matched to the model's skeleton by name, never by position.

use hashbrown::HashMap;
use tracing::debug;

use super::cursor::{Cursor, parse_f32, unexpected};
use super::{ParseOptions, ParserState, parse_coordinate_system};
use crate::{MAX_FRAMES, MAX_TABLE_DEPTH};
use crate::animation::{Animation, JointChannels, SkeletonPose, TransformOrder};
use crate::error::{EggError, ParseWarning, Result};
use crate::mesh::Model;
use crate::tokenizer::Token;

const SKELETON_TABLE: &str = "<skeleton>";

pub(super) fn parse(source: &str, model: &Model, options: &ParseOptions) -> Result<Animation> {
    let skeleton = model.skeleton.as_deref().ok_or(EggError::MissingSkeleton)?;

    let mut cursor = Cursor::new(source);
    let mut state = ParserState::new(options);
    let mut builder = AnimationBuilder {
        joints: skeleton.name_map(),
        joint_count: skeleton.len(),
        rate: None,
        poses: Vec::new(),
    };

    let mut found = false;
    while let Some(token) = cursor.next() {
        match token.text {
            "<CoordinateSystem>" => parse_coordinate_system(&mut cursor, &mut state)?,
            "<Table>" => {
                if cursor.peek().is_some_and(|t| t.unquoted() == SKELETON_TABLE) {
                    cursor.next();
                    cursor.expect_open("<skeleton> table")?;
                    parse_table_body(&mut cursor, &mut builder, &mut state, 0)?;
                    found = true;
                    break;
                }
            }
            _ => {}
        }
    }
    if !found {
        return Err(EggError::MissingSkeletonTable);
    }

    let rate = builder.rate.unwrap_or(0);
    let poses = builder.poses;
    let length = if rate > 0 {
        poses.len() as f32 / rate as f32
    } else {
        0.0
    };
    Ok(Animation {
        length,
        rate,
        poses,
        warnings: state.warnings,
    })
}

/// Per-frame poses under construction
struct AnimationBuilder<'s> {
    joints: HashMap<&'s str, usize>,
    joint_count: usize,
    /// First `fps` seen; also the number of frames
    rate: Option<u32>,
    poses: Vec<SkeletonPose>,
}

impl AnimationBuilder<'_> {
    fn apply(&mut self, joint: &str, line: usize, xfm: Xfm, state: &mut ParserState) -> Result<()> {
        if let Some(fps) = xfm.fps {
            match self.rate {
                None => {
                    debug!("Allocating {} frames for {} joints", fps, self.joint_count);
                    self.rate = Some(fps);
                    self.poses = vec![SkeletonPose::identity(self.joint_count); fps as usize];
                }
                Some(rate) if rate != fps => state.warn(ParseWarning::FrameRateMismatch {
                    joint: joint.to_string(),
                    expected: rate,
                    found: fps,
                }),
                Some(_) => {}
            }
        }

        if self.rate.is_none() && xfm.has_samples() {
            return Err(EggError::MissingFrameRate {
                line,
                joint: joint.to_string(),
            });
        }

        let Some(&index) = self.joints.get(joint) else {
            state.warn(ParseWarning::UnknownJoint {
                name: joint.to_string(),
            });
            return Ok(());
        };

        let order = match xfm.order.as_deref() {
            Some(codes) => {
                let (order, unknown) = TransformOrder::parse(codes);
                for code in unknown {
                    state.warn(ParseWarning::UnknownOrderCode {
                        joint: joint.to_string(),
                        code,
                    });
                }
                order
            }
            None => {
                if xfm.has_samples() {
                    state.warn(ParseWarning::MissingOrder {
                        joint: joint.to_string(),
                    });
                }
                TransformOrder::default()
            }
        };

        for (frame, pose) in self.poses.iter_mut().enumerate() {
            pose.transforms[index] = xfm.channels.pose_matrix(&order, frame, state.coords);
        }
        Ok(())
    }
}

/// Contents of one `<Xfm$Anim_S$>` block
#[derive(Default)]
struct Xfm {
    fps: Option<u32>,
    order: Option<String>,
    channels: JointChannels,
}

impl Xfm {
    fn has_samples(&self) -> bool {
        let c = &self.channels;
        [
            &c.scale_x,
            &c.scale_y,
            &c.scale_z,
            &c.roll,
            &c.pitch,
            &c.heading,
            &c.translate_x,
            &c.translate_y,
            &c.translate_z,
        ]
        .iter()
        .any(|channel| !channel.is_empty())
    }
}

/// Child tables of an already opened table, through its `}`
fn parse_table_body(
    cursor: &mut Cursor<'_>,
    builder: &mut AnimationBuilder<'_>,
    state: &mut ParserState,
    depth: usize,
) -> Result<()> {
    loop {
        let token = cursor.expect_token("<Table> block")?;
        match token.text {
            "}" => return Ok(()),
            "{" => cursor.skip_block("<Table> block")?,
            "<Table>" => parse_joint_table(cursor, builder, state, depth + 1)?,
            _ if token.is_tag() => cursor.skip_tagged_block("<Table> entry")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }
}

/// `<Table> joint { [<Xfm$Anim_S$> xform { ... }] [<Table> child { ... }]* }`
fn parse_joint_table(
    cursor: &mut Cursor<'_>,
    builder: &mut AnimationBuilder<'_>,
    state: &mut ParserState,
    depth: usize,
) -> Result<()> {
    let name = cursor.expect_token("<Table> name")?;
    if depth > MAX_TABLE_DEPTH {
        return Err(EggError::NestingTooDeep {
            line: name.line,
            max: MAX_TABLE_DEPTH,
        });
    }
    let joint = if name.is_open() {
        ""
    } else {
        cursor.expect_open("<Table> block")?;
        name.unquoted()
    };

    loop {
        let token = cursor.expect_token("<Table> block")?;
        match token.text {
            "}" => return Ok(()),
            "{" => cursor.skip_block("<Table> block")?,
            "<Xfm$Anim_S$>" => {
                cursor.skip_to_open("<Xfm$Anim_S$> block")?;
                let xfm = parse_xfm(cursor)?;
                builder.apply(joint, token.line, xfm, state)?;
            }
            "<Table>" => parse_joint_table(cursor, builder, state, depth + 1)?,
            // <Xfm$Anim> matrix tables, <Char*> fields of the bundle, ...
            _ if token.is_tag() => cursor.skip_tagged_block("<Table> entry")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }
}

/// Body of an `<Xfm$Anim_S$>` block whose `{` was already consumed
fn parse_xfm(cursor: &mut Cursor<'_>) -> Result<Xfm> {
    let mut xfm = Xfm::default();
    loop {
        let token = cursor.expect_token("<Xfm$Anim_S$> block")?;
        match token.text {
            "}" => return Ok(xfm),
            "{" => cursor.skip_block("<Xfm$Anim_S$> block")?,
            "<Scalar>" => {
                let name = cursor.expect_token("<Scalar> name")?;
                let value = scalar_value(cursor, "<Scalar> block")?;
                if name.unquoted() == "fps" {
                    let value = value.ok_or(EggError::InvalidFrameRate {
                        line: name.line,
                        value: String::new(),
                    })?;
                    xfm.fps = Some(parse_frame_rate(value)?);
                }
            }
            "<Char*>" => {
                let name = cursor.expect_token("<Char*> name")?;
                let value = scalar_value(cursor, "<Char*> block")?;
                if name.unquoted() == "order" {
                    xfm.order = Some(value.map(|t| t.unquoted().to_string()).unwrap_or_default());
                }
            }
            "<S$Anim>" => {
                let name = cursor.expect_token("<S$Anim> name")?;
                cursor.expect_open("<S$Anim> block")?;
                let values = parse_channel(cursor)?;
                match xfm.channels.channel_mut(name.unquoted()) {
                    Some(channel) => *channel = values,
                    None => debug!("Ignoring unknown channel `{}` (line {})", name.text, name.line),
                }
            }
            _ if token.is_tag() => cursor.skip_tagged_block("<Xfm$Anim_S$> entry")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }
}

/// `{ value }` after a scalar's name; `None` for an empty block
fn scalar_value<'a>(cursor: &mut Cursor<'a>, context: &'static str) -> Result<Option<Token<'a>>> {
    cursor.expect_open(context)?;
    let token = cursor.expect_token(context)?;
    if token.is_close() {
        return Ok(None);
    }
    cursor.expect_close(context)?;
    Ok(Some(token))
}

/// Body of an `<S$Anim>` block: the values of its `<V>` block
fn parse_channel(cursor: &mut Cursor<'_>) -> Result<Vec<f32>> {
    let mut values = Vec::new();
    loop {
        let token = cursor.expect_token("<S$Anim> block")?;
        match token.text {
            "}" => return Ok(values),
            "{" => cursor.skip_block("<S$Anim> block")?,
            "<V>" => {
                cursor.skip_to_open("<V> block")?;
                values = cursor.read_numbers("<V> block")?;
            }
            // Per-channel <Scalar> fps is not supported
            _ if token.is_tag() => cursor.skip_tagged_block("<S$Anim> entry")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }
}

/// Integer part of the `fps` scalar, between 1 and `MAX_FRAMES`
fn parse_frame_rate(token: Token<'_>) -> Result<u32> {
    let invalid = || EggError::InvalidFrameRate {
        line: token.line,
        value: token.text.to_string(),
    };
    let value = parse_f32(token).map_err(|_| invalid())?.trunc();
    if !value.is_finite() || value < 1.0 || value > MAX_FRAMES as f32 {
        return Err(invalid());
    }
    Ok(value as u32)
}
