//! PPTX deck parser implementation.

use super::model::{Color, Deck, EmuRect, Fill, Shape, ShapeKind, Slide, SlideSize};
use crate::container::{OoxmlContainer, Relationships};
use crate::error::{Error, Result};
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

// Relationship type suffixes, shared by transitional and strict namespaces.
const REL_SLIDE_LAYOUT: &str = "/slideLayout";
const REL_SLIDE_MASTER: &str = "/slideMaster";
const REL_THEME: &str = "/theme";

/// Parser for the paintable content of a PPTX deck.
pub struct DeckParser {
    container: OoxmlContainer,
}

impl DeckParser {
    /// Create a parser from the bytes of a `.pptx` file.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        if !container.exists(PRESENTATION_PART) {
            return Err(Error::MissingComponent(PRESENTATION_PART.to_string()));
        }
        Ok(Self { container })
    }

    /// Parse the page size and every slide in `p:sldIdLst` order.
    pub fn parse(&self) -> Result<Deck> {
        let xml = self.container.read_xml(PRESENTATION_PART)?;
        let (size, slide_rel_ids) = parse_presentation(&xml)?;
        let rels = self.container.read_relationships(PRESENTATION_PART)?;

        let mut layouts = HashMap::new();
        let mut slides = Vec::with_capacity(slide_rel_ids.len());
        for (index, rel_id) in slide_rel_ids.iter().enumerate() {
            let rel = rels.get(rel_id).ok_or_else(|| {
                Error::InvalidData(format!("slide relationship {} not found", rel_id))
            })?;
            let part = OoxmlContainer::resolve_path(PRESENTATION_PART, &rel.target);
            slides.push(self.parse_slide(index, part, &mut layouts)?);
        }

        debug!(
            "parsed deck: {} slides, {}x{} EMU",
            slides.len(),
            size.cx,
            size.cy
        );
        Ok(Deck { size, slides })
    }

    fn parse_slide(
        &self,
        index: usize,
        part: String,
        layouts: &mut HashMap<String, Inherited>,
    ) -> Result<Slide> {
        let rels = self.container.read_relationships(&part)?;
        let inherited = match related_part(&part, &rels, REL_SLIDE_LAYOUT) {
            Some(layout) => layouts
                .entry(layout)
                .or_insert_with_key(|layout| {
                    self.load_layout(layout).unwrap_or_else(|e| {
                        warn!("{}: ignoring layout {}: {}", part, layout, e);
                        Inherited::default()
                    })
                })
                .clone(),
            None => Inherited::default(),
        };

        let xml = self.container.read_xml(&part)?;
        let content = parse_slide_xml_with(&xml, &inherited.theme)?;

        let background = content
            .background
            .and_then(|fill| self.resolve_fill(&part, &rels, fill))
            .or(inherited.background);
        let shapes = content
            .shapes
            .into_iter()
            .map(|raw| Shape {
                kind: raw.kind,
                bounds: raw.bounds,
                fill: raw.fill.and_then(|fill| self.resolve_fill(&part, &rels, fill)),
            })
            .collect();

        Ok(Slide {
            index,
            part,
            background,
            shapes,
        })
    }

    /// Turn a picture relationship into picture bytes; unresolvable pictures are dropped.
    fn resolve_fill(&self, part: &str, rels: &Relationships, fill: FillRef) -> Option<Fill> {
        match fill {
            FillRef::Solid(color) => Some(Fill::Solid(color)),
            FillRef::Picture(rel_id) => {
                let rel = match rels.get(&rel_id) {
                    Some(rel) if !rel.external => rel,
                    _ => {
                        warn!("{}: picture {} has no embedded target", part, rel_id);
                        return None;
                    }
                };
                let media = OoxmlContainer::resolve_path(part, &rel.target);
                match self.container.read_binary(&media) {
                    Ok(bytes) => Some(Fill::Picture(bytes)),
                    Err(e) => {
                        warn!("{}: skipping picture {}: {}", part, media, e);
                        None
                    }
                }
            }
        }
    }

    /// Theme colours and background a slide layout passes on to its slides.
    fn load_layout(&self, layout: &str) -> Result<Inherited> {
        let rels = self.container.read_relationships(layout)?;
        let master = match related_part(layout, &rels, REL_SLIDE_MASTER) {
            Some(master) => self.load_master(&master)?,
            None => Inherited::default(),
        };
        let background = self.part_background(layout, &rels, &master.theme)?;
        debug!("layout {}: own background {}", layout, background.is_some());

        Ok(Inherited {
            background: background.or(master.background),
            theme: master.theme,
        })
    }

    fn load_master(&self, master: &str) -> Result<Inherited> {
        let rels = self.container.read_relationships(master)?;
        let xml = self.container.read_xml(master)?;

        let mut theme = match related_part(master, &rels, REL_THEME) {
            Some(theme) => parse_theme_colors(&self.container.read_xml(&theme)?)?,
            None => ThemeColors::default(),
        };
        theme.color_map = parse_color_map(&xml)?;

        let background = parse_slide_xml_with(&xml, &theme)?
            .background
            .and_then(|fill| self.resolve_fill(master, &rels, fill));
        Ok(Inherited { theme, background })
    }

    fn part_background(
        &self,
        part: &str,
        rels: &Relationships,
        theme: &ThemeColors,
    ) -> Result<Option<Fill>> {
        let xml = self.container.read_xml(part)?;
        Ok(parse_slide_xml_with(&xml, theme)?
            .background
            .and_then(|fill| self.resolve_fill(part, rels, fill)))
    }
}

/// What a slide takes from its layout and master.
#[derive(Debug, Clone, Default)]
pub(crate) struct Inherited {
    pub theme: ThemeColors,
    pub background: Option<Fill>,
}

/// Target part of the first internal relationship whose type ends with `kind`.
fn related_part(part: &str, rels: &Relationships, kind: &str) -> Option<String> {
    rels.iter()
        .find(|rel| !rel.external && rel.rel_type.ends_with(kind))
        .map(|rel| OoxmlContainer::resolve_path(part, &rel.target))
}

/// Theme colour scheme plus the master's `p:clrMap`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ThemeColors {
    /// `dk1`, `lt1`, `accent1`, ... to colour
    pub scheme: HashMap<String, Color>,
    /// `bg1`, `tx1`, ... to scheme slot
    pub color_map: HashMap<String, String>,
}

impl ThemeColors {
    /// Resolve an `a:schemeClr` value. `phClr` and unknown names yield `None`.
    pub fn resolve(&self, name: &str) -> Option<Color> {
        let slot = match self.color_map.get(name) {
            Some(slot) => slot.as_str(),
            None => match name {
                "bg1" => "lt1",
                "tx1" => "dk1",
                "bg2" => "lt2",
                "tx2" => "dk2",
                other => other,
            },
        };
        self.scheme.get(slot).copied()
    }
}

/// Read the `a:clrScheme` of a theme part.
pub(crate) fn parse_theme_colors(xml: &str) -> Result<ThemeColors> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut theme = ThemeColors::default();
    let mut in_scheme = false;
    let mut slot: Option<String> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"clrScheme" => in_scheme = true,
                name if in_scheme && slot.is_none() => {
                    slot = Some(String::from_utf8_lossy(name).into_owned());
                }
                _ => scheme_color(&mut theme, slot.as_deref(), &e),
            },
            Ok(Event::Empty(e)) => scheme_color(&mut theme, slot.as_deref(), &e),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"clrScheme" => in_scheme = false,
                name if slot.as_deref().map(str::as_bytes) == Some(name) => slot = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(theme)
}

fn scheme_color(theme: &mut ThemeColors, slot: Option<&str>, e: &BytesStart<'_>) {
    let hex = match e.local_name().as_ref() {
        b"srgbClr" => str_attr(e, b"val"),
        b"sysClr" => str_attr(e, b"lastClr"),
        _ => None,
    };
    if let (Some(slot), Some(color)) = (slot, hex.and_then(|hex| Color::from_hex(&hex))) {
        theme.scheme.insert(slot.to_string(), color);
    }
}

/// Read the `p:clrMap` attributes of a slide master.
pub(crate) fn parse_color_map(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"clrMap" => {
                return Ok(e
                    .attributes()
                    .flatten()
                    .map(|attr| {
                        (
                            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                            String::from_utf8_lossy(&attr.value).into_owned(),
                        )
                    })
                    .collect());
            }
            Ok(Event::Eof) => return Ok(HashMap::new()),
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Fill as written in slide XML, before picture relationships are resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FillRef {
    Solid(Color),
    Picture(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawShape {
    pub kind: ShapeKind,
    pub bounds: EmuRect,
    pub fill: Option<FillRef>,
}

#[derive(Debug, Default)]
pub(crate) struct SlideContent {
    pub background: Option<FillRef>,
    pub shapes: Vec<RawShape>,
}

/// Read `p:sldSz` and the ordered slide relationship IDs.
pub(crate) fn parse_presentation(xml: &str) -> Result<(SlideSize, Vec<String>)> {
    let mut size = SlideSize::default();
    let mut rel_ids = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sldSz" => {
                    if let (Some(cx), Some(cy)) = (int_attr(&e, b"cx"), int_attr(&e, b"cy")) {
                        if cx > 0 && cy > 0 {
                            size = SlideSize { cx, cy };
                        }
                    }
                }
                b"sldId" => {
                    // r:id, not the bare numeric id
                    let rel_id = e.attributes().flatten().find_map(|attr| {
                        (attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id")
                            .then(|| String::from_utf8_lossy(&attr.value).into_owned())
                    });
                    if let Some(rel_id) = rel_id {
                        rel_ids.push(rel_id);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok((size, rel_ids))
}

#[derive(Debug)]
struct ShapeBuilder {
    kind: ShapeKind,
    hidden: bool,
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    fill: Option<FillRef>,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            hidden: false,
            off: None,
            ext: None,
            fill: None,
        }
    }
}

/// Child-to-parent coordinate mapping of a `p:grpSp`.
#[derive(Debug, Default)]
struct GroupTransform {
    hidden: bool,
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    ch_off: Option<(i64, i64)>,
    ch_ext: Option<(i64, i64)>,
}

impl GroupTransform {
    fn apply(&self, rect: EmuRect) -> EmuRect {
        let (off, ch_off) = (self.off.unwrap_or_default(), self.ch_off.unwrap_or_default());
        let scale = |ext: Option<(i64, i64)>, ch_ext: Option<(i64, i64)>| match (ext, ch_ext) {
            (Some(e), Some(c)) if c.0 != 0 && c.1 != 0 => {
                (e.0 as f64 / c.0 as f64, e.1 as f64 / c.1 as f64)
            }
            _ => (1.0, 1.0),
        };
        let (sx, sy) = scale(self.ext, self.ch_ext);

        EmuRect {
            x: off.0.saturating_add((rect.x.saturating_sub(ch_off.0) as f64 * sx).round() as i64),
            y: off.1.saturating_add((rect.y.saturating_sub(ch_off.1) as f64 * sy).round() as i64),
            cx: (rect.cx as f64 * sx).round() as i64,
            cy: (rect.cy as f64 * sy).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorTarget {
    Background,
    Shape,
}

/// Walks a slide, layout or master part and collects what the rasterizer paints.
#[derive(Default)]
struct SlideWalker {
    theme: ThemeColors,
    stack: Vec<Vec<u8>>,
    groups: Vec<GroupTransform>,
    current: Option<ShapeBuilder>,
    color_target: Option<ColorTarget>,
    content: SlideContent,
}

impl SlideWalker {
    fn parent(&self) -> &[u8] {
        self.stack.last().map(Vec::as_slice).unwrap_or_default()
    }

    fn grandparent(&self) -> &[u8] {
        self.stack
            .len()
            .checked_sub(2)
            .map(|i| self.stack[i].as_slice())
            .unwrap_or_default()
    }

    fn inside(&self, name: &[u8]) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.local_name();
        match name.as_ref() {
            b"sp" => self.current = Some(ShapeBuilder::new(ShapeKind::Shape)),
            b"pic" => self.current = Some(ShapeBuilder::new(ShapeKind::Picture)),
            b"cxnSp" => self.current = Some(ShapeBuilder::new(ShapeKind::Connector)),
            b"grpSp" => self.groups.push(GroupTransform::default()),
            b"cNvPr" => {
                let hidden = matches!(str_attr(e, b"hidden").as_deref(), Some("1" | "true"));
                if hidden {
                    match self.parent() {
                        b"nvSpPr" | b"nvPicPr" | b"nvCxnSpPr" => {
                            if let Some(shape) = self.current.as_mut() {
                                shape.hidden = true;
                            }
                        }
                        b"nvGrpSpPr" => {
                            if let Some(group) = self.groups.last_mut() {
                                group.hidden = true;
                            }
                        }
                        // graphicFrame and other untracked elements
                        _ => {}
                    }
                }
            }
            b"off" | b"ext" | b"chOff" | b"chExt" if self.parent() == b"xfrm" => {
                let pair = match name.as_ref() {
                    b"off" | b"chOff" => int_attr(e, b"x").zip(int_attr(e, b"y")),
                    _ => int_attr(e, b"cx").zip(int_attr(e, b"cy")),
                };
                let owner = self.grandparent().to_vec();
                match (owner.as_slice(), self.current.as_mut()) {
                    (b"spPr", Some(shape)) => match name.as_ref() {
                        b"off" => shape.off = pair,
                        b"ext" => shape.ext = pair,
                        _ => {}
                    },
                    (b"grpSpPr", None) => {
                        if let Some(group) = self.groups.last_mut() {
                            match name.as_ref() {
                                b"off" => group.off = pair,
                                b"ext" => group.ext = pair,
                                b"chOff" => group.ch_off = pair,
                                _ => group.ch_ext = pair,
                            }
                        }
                    }
                    _ => {}
                }
            }
            b"srgbClr" | b"schemeClr" | b"sysClr"
                if matches!(self.parent(), b"solidFill" | b"bgRef") =>
            {
                let color = match name.as_ref() {
                    b"srgbClr" => str_attr(e, b"val").and_then(|v| Color::from_hex(&v)),
                    b"sysClr" => str_attr(e, b"lastClr").and_then(|v| Color::from_hex(&v)),
                    _ => str_attr(e, b"val").and_then(|v| self.theme.resolve(&v)),
                };
                let target = if self.inside(b"bgPr") || self.parent() == b"bgRef" {
                    Some(ColorTarget::Background)
                } else if self.current.is_some() && self.grandparent() == b"spPr" {
                    Some(ColorTarget::Shape)
                } else {
                    None
                };
                if let (Some(color), Some(target)) = (color, target) {
                    self.set_fill(target, FillRef::Solid(color));
                    self.color_target = Some(target);
                }
            }
            b"alpha" if matches!(self.parent(), b"srgbClr" | b"schemeClr" | b"sysClr") => {
                if let (Some(target), Some(alpha)) = (self.color_target, int_attr(e, b"val")) {
                    if let Some(FillRef::Solid(color)) = self.fill_mut(target) {
                        *color = color.with_alpha(alpha);
                    }
                }
            }
            b"noFill" if self.parent() == b"spPr" => {
                if let Some(shape) = self.current.as_mut() {
                    shape.fill = None;
                }
            }
            b"blip" if self.parent() == b"blipFill" => {
                let Some(rel_id) = str_attr(e, b"embed") else {
                    return;
                };
                if self.inside(b"bgPr") {
                    self.set_fill(ColorTarget::Background, FillRef::Picture(rel_id));
                } else if self.current.is_some() {
                    self.set_fill(ColorTarget::Shape, FillRef::Picture(rel_id));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"sp" | b"pic" | b"cxnSp" => {
                if let Some(shape) = self.current.take() {
                    self.finish_shape(shape);
                }
            }
            b"grpSp" => {
                self.groups.pop();
            }
            b"srgbClr" | b"schemeClr" | b"sysClr" => self.color_target = None,
            _ => {}
        }
    }

    fn fill_mut(&mut self, target: ColorTarget) -> Option<&mut FillRef> {
        match target {
            ColorTarget::Background => self.content.background.as_mut(),
            ColorTarget::Shape => self.current.as_mut().and_then(|s| s.fill.as_mut()),
        }
    }

    fn set_fill(&mut self, target: ColorTarget, fill: FillRef) {
        match target {
            ColorTarget::Background => self.content.background = Some(fill),
            ColorTarget::Shape => {
                if let Some(shape) = self.current.as_mut() {
                    shape.fill = Some(fill);
                }
            }
        }
    }

    fn finish_shape(&mut self, shape: ShapeBuilder) {
        if shape.hidden || self.groups.iter().any(|g| g.hidden) {
            return;
        }
        let Some((cx, cy)) = shape.ext else {
            // Placeholders inherit geometry from the layout, which is not painted.
            debug!("skipping {:?} without explicit extent", shape.kind);
            return;
        };
        let (x, y) = shape.off.unwrap_or_default();
        let bounds = self
            .groups
            .iter()
            .rev()
            .fold(EmuRect { x, y, cx, cy }, |rect, group| group.apply(rect));

        self.content.shapes.push(RawShape {
            kind: shape.kind,
            bounds,
            fill: shape.fill,
        });
    }
}

/// Collect background and shapes of one slide part, without a theme.
pub(crate) fn parse_slide_xml(xml: &str) -> Result<SlideContent> {
    parse_slide_xml_with(xml, &ThemeColors::default())
}

/// Collect background and shapes, resolving `a:schemeClr` through `theme`.
pub(crate) fn parse_slide_xml_with(xml: &str, theme: &ThemeColors) -> Result<SlideContent> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut walker = SlideWalker {
        theme: theme.clone(),
        ..Default::default()
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                walker.open(&e);
                walker.stack.push(e.local_name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                walker.open(&e);
                walker.close(e.local_name().as_ref());
            }
            Ok(Event::End(e)) => {
                walker.stack.pop();
                walker.close(e.local_name().as_ref());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.content)
}

fn str_attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn int_attr(e: &BytesStart<'_>, local: &[u8]) -> Option<i64> {
    str_attr(e, local).and_then(|v| v.trim().parse().ok())
}
