use anyhow::{Result, anyhow};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;

// @const: WordprocessingML element names
const PARAGRAPH: &[u8] = b"w:p";
const RUN: &[u8] = b"w:r";
const RUN_PROPERTIES: &[u8] = b"w:rPr";
const TEXT: &[u8] = b"w:t";
const TABLE: &[u8] = b"w:tbl";
const VERTICAL_ALIGN: &[u8] = b"w:vertAlign";
const TAB: &[u8] = b"w:tab";
const BREAK: &[u8] = b"w:br";
const CARRIAGE_RETURN: &[u8] = b"w:cr";

// @struct: One w:t element of a run
#[derive(Debug, Clone)]
struct TextSlot {
    // @field: Index of the opening (or self-closing) event
    open: usize,
    // @field: Indices of the text events inside
    content: Vec<usize>,
    self_closing: bool,
}

/// A run of uniformly formatted text
#[derive(Debug, Clone, Default)]
pub struct Run {
    slots: Vec<TextSlot>,
    // @field: Events of the w:tab/w:br/w:cr elements folded into `text`
    breaks: Vec<usize>,
    text: String,
    superscript: bool,
    subscript: bool,
    dirty: bool,
}

impl Run {
    /// Text of the run: w:t content, with w:tab as '\t' and line breaks as '\n'
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.dirty = true;
        }
    }

    pub fn is_superscript(&self) -> bool {
        self.superscript
    }

    pub fn is_subscript(&self) -> bool {
        self.subscript
    }
}

/// A paragraph and its runs, in document order
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    in_table: bool,
}

impl Paragraph {
    /// Whether the paragraph sits in a table cell
    pub fn in_table(&self) -> bool {
        self.in_table
    }

    /// All run texts joined
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// The main document part as an event list plus a paragraph index into it
///
/// Events are kept exactly as read. Serializing only touches the w:t
/// elements of runs whose text changed.
pub struct WordDocument {
    events: Vec<Event<'static>>,
    paragraphs: Vec<Paragraph>,
    table_count: usize,
}

impl WordDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut events = Vec::new();
        let mut element_stack: Vec<Vec<u8>> = Vec::new();
        let mut paragraph_stack: Vec<Paragraph> = Vec::new();
        let mut run_stack: Vec<Run> = Vec::new();
        let mut open_slot: Option<TextSlot> = None;
        let mut open_break = false;
        let mut paragraphs = Vec::new();
        let mut table_depth = 0usize;
        let mut table_count = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| anyhow!("XML parse error at position {}: {}", reader.buffer_position(), e))?
                .into_owned();
            let index = events.len();
            let parent_is_run = element_stack.last().is_some_and(|p| p.as_slice() == RUN);

            match &event {
                Event::Start(e) => {
                    let name = e.name().as_ref().to_vec();
                    match name.as_slice() {
                        PARAGRAPH => paragraph_stack.push(Paragraph {
                            runs: Vec::new(),
                            in_table: table_depth > 0,
                        }),
                        TABLE => {
                            table_depth += 1;
                            table_count += 1;
                        }
                        RUN if !paragraph_stack.is_empty() => run_stack.push(Run::default()),
                        TEXT if parent_is_run && !run_stack.is_empty() => {
                            open_slot = Some(TextSlot {
                                open: index,
                                content: Vec::new(),
                                self_closing: false,
                            });
                        }
                        TAB | BREAK | CARRIAGE_RETURN if parent_is_run => {
                            if let (Some(run), Some(c)) = (run_stack.last_mut(), Self::break_char(e)?) {
                                run.text.push(c);
                                run.breaks.push(index);
                                open_break = true;
                            }
                        }
                        VERTICAL_ALIGN if Self::in_run_properties(&element_stack) => {
                            if let Some(run) = run_stack.last_mut() {
                                Self::apply_vertical_align(run, e)?;
                            }
                        }
                        _ => {}
                    }
                    element_stack.push(name);
                }
                Event::Empty(e) => match e.name().as_ref() {
                    TEXT if parent_is_run => {
                        if let Some(run) = run_stack.last_mut() {
                            run.slots.push(TextSlot {
                                open: index,
                                content: Vec::new(),
                                self_closing: true,
                            });
                        }
                    }
                    TAB | BREAK | CARRIAGE_RETURN if parent_is_run => {
                        if let (Some(run), Some(c)) = (run_stack.last_mut(), Self::break_char(e)?) {
                            run.text.push(c);
                            run.breaks.push(index);
                        }
                    }
                    VERTICAL_ALIGN if Self::in_run_properties(&element_stack) => {
                        if let Some(run) = run_stack.last_mut() {
                            Self::apply_vertical_align(run, e)?;
                        }
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if let (Some(slot), Some(run)) = (open_slot.as_mut(), run_stack.last_mut()) {
                        slot.content.push(index);
                        run.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let (Some(slot), Some(run)) = (open_slot.as_mut(), run_stack.last_mut()) {
                        slot.content.push(index);
                        run.text.push_str(std::str::from_utf8(e)?);
                    }
                }
                Event::End(e) => {
                    element_stack.pop();
                    match e.name().as_ref() {
                        TEXT => {
                            if let (Some(slot), Some(run)) = (open_slot.take(), run_stack.last_mut()) {
                                run.slots.push(slot);
                            }
                        }
                        RUN => {
                            if let (Some(run), Some(paragraph)) = (run_stack.pop(), paragraph_stack.last_mut()) {
                                paragraph.runs.push(run);
                            }
                        }
                        PARAGRAPH => {
                            if let Some(paragraph) = paragraph_stack.pop() {
                                paragraphs.push(paragraph);
                            }
                        }
                        TABLE => table_depth = table_depth.saturating_sub(1),
                        TAB | BREAK | CARRIAGE_RETURN if open_break => {
                            if let Some(run) = run_stack.last_mut() {
                                run.breaks.push(index);
                            }
                            open_break = false;
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            events.push(event);
        }

        Ok(Self {
            events,
            paragraphs,
            table_count,
        })
    }

    // @checks: Innermost open elements are w:r > w:rPr
    fn in_run_properties(element_stack: &[Vec<u8>]) -> bool {
        match element_stack {
            [.., run, props] => run.as_slice() == RUN && props.as_slice() == RUN_PROPERTIES,
            _ => false,
        }
    }

    // @returns: Character a run-level w:tab, w:br or w:cr stands for
    // Page and column breaks carry no text.
    fn break_char(e: &BytesStart) -> Result<Option<char>> {
        match e.name().as_ref() {
            TAB => Ok(Some('\t')),
            CARRIAGE_RETURN => Ok(Some('\n')),
            _ => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"w:type" && attr.value.as_ref() != b"textWrapping" {
                        return Ok(None);
                    }
                }
                Ok(Some('\n'))
            }
        }
    }

    fn apply_vertical_align(run: &mut Run, e: &BytesStart) -> Result<()> {
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"w:val" {
                match attr.value.as_ref() {
                    b"superscript" => run.superscript = true,
                    b"subscript" => run.subscript = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    /// Number of w:tbl elements, nested ones included
    pub fn table_count(&self) -> usize {
        self.table_count
    }

    /// Serialize back to XML, rewriting only changed runs
    pub fn to_xml(&self) -> Result<String> {
        let mut rewrites: HashMap<usize, Rewrite> = HashMap::new();
        for run in self.paragraphs.iter().flat_map(|p| p.runs.iter()).filter(|r| r.dirty) {
            for (i, slot) in run.slots.iter().enumerate() {
                // The whole run text goes into the first w:t, the others are emptied
                let text = if i == 0 { Some(run.text.clone()) } else { None };
                rewrites.insert(
                    slot.open,
                    Rewrite::Open {
                        text,
                        self_closing: slot.self_closing,
                    },
                );
                for &content in &slot.content {
                    rewrites.insert(content, Rewrite::Drop);
                }
            }
            // Tabs and breaks now live in the rewritten text
            if !run.slots.is_empty() || run.text.is_empty() {
                for &event in &run.breaks {
                    rewrites.insert(event, Rewrite::Drop);
                }
            }
        }

        let mut writer = Writer::new(Vec::new());
        for (index, event) in self.events.iter().enumerate() {
            match (rewrites.get(&index), event) {
                (None, _) => writer.write_event(event)?,
                (Some(Rewrite::Drop), _) => {}
                (Some(Rewrite::Open { text, self_closing }), Event::Start(start) | Event::Empty(start)) => {
                    let text = text.as_deref().unwrap_or_default();
                    if *self_closing && text.is_empty() {
                        writer.write_event(event)?;
                        continue;
                    }
                    let start = Self::preserve_space(start)?;
                    Self::write_text_segments(&mut writer, &start, text)?;
                    if *self_closing {
                        writer.write_event(Event::End(BytesEnd::new("w:t")))?;
                    }
                }
                (Some(Rewrite::Open { .. }), _) => writer.write_event(event)?,
            }
        }

        Ok(String::from_utf8(writer.into_inner())?)
    }

    // Writes `text` as w:t content, turning '\t' into w:tab and line breaks
    // into w:br between w:t elements. The last w:t is left open.
    fn write_text_segments(writer: &mut Writer<Vec<u8>>, start: &BytesStart, text: &str) -> Result<()> {
        writer.write_event(Event::Start(start.borrow()))?;
        let mut segment = String::new();
        for c in text.chars() {
            let separator = match c {
                '\t' => "w:tab",
                '\n' | '\r' => "w:br",
                _ => {
                    segment.push(c);
                    continue;
                }
            };
            writer.write_event(Event::Text(BytesText::new(&segment)))?;
            writer.write_event(Event::End(BytesEnd::new("w:t")))?;
            writer.write_event(Event::Empty(BytesStart::new(separator)))?;
            writer.write_event(Event::Start(start.borrow()))?;
            segment.clear();
        }
        writer.write_event(Event::Text(BytesText::new(&segment)))?;
        Ok(())
    }

    // @returns: Copy of a w:t start tag with xml:space="preserve"
    fn preserve_space(start: &BytesStart) -> Result<BytesStart<'static>> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut tag = BytesStart::new(name);
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_ref() != b"xml:space" {
                tag.push_attribute(attr);
            }
        }
        tag.push_attribute(("xml:space", "preserve"));
        Ok(tag)
    }
}

// @enum: What to do with an event when serializing
enum Rewrite {
    Open { text: Option<String>, self_closing: bool },
    Drop,
}
