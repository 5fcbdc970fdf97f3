//! End-to-end flows through a small editor harness: a `PlainHost` document,
//! node views rendered into a `MemoryDom`, and a re-render pass after every
//! write that updates views in place or re-creates them.

use std::rc::Rc;

use figure_view_core::{
    Alignment, Block, CaptionAction, ClickOutcome, ControlKind, Corner, Dimension, Dom,
    EditorHost, FigureOptions, ImageAttrs, ImageNode, IntentOutcome, MemoryDom, MemoryElement,
    NodeView, OverlayIntent, PlainHost, PointerSource, ViewContext, apply_input_rule,
    render_html,
};

struct Editor {
    ctx: ViewContext<MemoryDom>,
    host: Rc<PlainHost>,
    views: Vec<Option<NodeView<MemoryDom>>>,
    recreated: usize,
}

impl Editor {
    fn new(blocks: Vec<Block>) -> Self {
        let mut editor = Self {
            ctx: ViewContext::new(MemoryDom::new(), FigureOptions::default()),
            host: Rc::new(PlainHost::new(blocks)),
            views: Vec::new(),
            recreated: 0,
        };
        editor.render();
        editor
    }

    fn create(&self, pos: usize, node: ImageNode) -> NodeView<MemoryDom> {
        let get_pos: figure_view_core::GetPos = Rc::new(move || Some(pos));
        NodeView::new(self.ctx.clone(), self.host.as_ref(), node, Some(get_pos)).unwrap()
    }

    /// Bring views in line with the document, the way a host re-renders
    /// after a transaction.
    fn render(&mut self) {
        let blocks = self.host.blocks();
        self.views.resize_with(blocks.len(), || None);
        for (pos, block) in blocks.into_iter().enumerate() {
            let Block::Image(node) = block else {
                continue;
            };
            let dom = self.ctx.dom.clone();
            match self.views[pos].take() {
                Some(mut view) => {
                    if view.update(node.clone()) {
                        self.views[pos] = Some(view);
                        continue;
                    }
                    let old = *view.dom();
                    view.destroy();
                    let fresh = self.create(pos, node);
                    dom.replace_with(&old, fresh.dom()).unwrap();
                    self.views[pos] = Some(fresh);
                    self.recreated += 1;
                }
                None => {
                    let fresh = self.create(pos, node);
                    dom.append_child(&dom.root(), fresh.dom()).unwrap();
                    self.views[pos] = Some(fresh);
                }
            }
        }
    }

    fn view(&mut self, pos: usize) -> &mut NodeView<MemoryDom> {
        self.views[pos].as_mut().unwrap()
    }

    fn click_image(&mut self, pos: usize) -> ClickOutcome {
        let image = *self.view(pos).image();
        self.view(pos).click(&image)
    }

    fn click_control(&mut self, pos: usize, kind: ControlKind) -> IntentOutcome {
        let host = self.host.clone();
        let view = self.view(pos);
        let control: MemoryElement = *view.controls().unwrap().find(kind).unwrap();
        let intent = view.control_intent(&control).unwrap();
        let outcome = view.handle_intent(host.as_ref(), intent);
        self.render();
        outcome
    }

    fn active_count(&self) -> usize {
        self.views
            .iter()
            .flatten()
            .filter(|v| v.is_active())
            .count()
    }
}

fn image_attrs(src: &str) -> ImageAttrs {
    ImageAttrs::from_pairs([("src", src), ("alt", "alt text"), ("title", "A title")])
}

#[test]
fn caption_add_rebuilds_with_one_editable_region() {
    let mut editor = Editor::new(vec![
        Block::Paragraph("before".into()),
        Block::Image(ImageNode::image(image_attrs("a.png"))),
    ]);
    assert_eq!(editor.view(1).content_dom(), None);

    editor.click_image(1);
    let outcome = editor.click_control(1, ControlKind::Caption(CaptionAction::Add));
    assert_eq!(outcome, IntentOutcome::Rebuilt);
    assert_eq!(editor.recreated, 1);

    let dom = editor.ctx.dom.clone();
    let view = editor.view(1);
    assert_eq!(dom.tag_name(view.dom()), "figure");
    let caption = *view.content_dom().unwrap();
    assert_eq!(dom.text_content(&caption), "Caption");
    assert!(!view.ignore_mutation(&caption));
    assert!(view.ignore_mutation(view.image()));
    assert_eq!(dom.children(&dom.root()).len(), 1);
    assert_eq!(editor.host.node_selection(), Some(1));
}

#[test]
fn image_figure_round_trip_keeps_attributes() {
    let mut editor = Editor::new(vec![Block::Image(ImageNode::image(image_attrs("a.png")))]);

    editor.click_image(0);
    editor.click_control(0, ControlKind::Caption(CaptionAction::Add));
    editor.click_image(0);
    let outcome = editor.click_control(0, ControlKind::Caption(CaptionAction::Remove));
    assert_eq!(outcome, IntentOutcome::Rebuilt);

    let node = editor.host.node_at(0).unwrap();
    assert!(!node.has_caption());
    assert_eq!(node.attrs.src(), Some("a.png"));
    assert_eq!(node.attrs.alt(), Some("alt text"));

    let dom = editor.ctx.dom.clone();
    let view = editor.view(0);
    assert_eq!(dom.tag_name(view.dom()), "div");
    assert_eq!(dom.find_descendant(view.dom(), "figcaption"), None);
    assert_eq!(view.content_dom(), None);
}

#[test]
fn one_active_widget_across_clicks() {
    let mut editor = Editor::new(
        (0..4)
            .map(|i| Block::Image(ImageNode::image(image_attrs(&format!("{i}.png")))))
            .collect(),
    );
    let outside = editor.ctx.dom.create_element("p").unwrap();
    editor
        .ctx
        .dom
        .append_child(&editor.ctx.dom.root(), &outside)
        .unwrap();

    for pos in [3, 0, 0, 2, 1, 3] {
        editor.click_image(pos);
        assert_eq!(editor.active_count(), 1);
    }
    for view in editor.views.iter_mut().flatten() {
        view.document_click(&outside);
    }
    assert_eq!(editor.active_count(), 0);
    for view in editor.views.iter_mut().flatten() {
        assert!(!view.document_click(&outside));
    }
}

#[test]
fn alignment_then_resize_updates_in_place() {
    let mut editor = Editor::new(vec![Block::Image(ImageNode::image(image_attrs("a.png")))]);
    editor.click_image(0);
    editor.click_control(0, ControlKind::Align(Alignment::Right));
    assert_eq!(editor.recreated, 0);
    assert!(editor.view(0).is_active());

    let wrapper = *editor.view(0).dom();
    editor.ctx.dom.set_offset_width(&wrapper, 400.0);
    let host = editor.host.clone();
    let view = editor.view(0);
    assert!(view.begin_resize(Corner::TopLeft, PointerSource::Mouse, 100.0));
    view.drag_resize(PointerSource::Mouse, 150.0);
    assert_eq!(view.end_resize(host.as_ref(), PointerSource::Mouse), IntentOutcome::Applied);
    editor.render();

    let attrs = editor.host.node_at(0).unwrap().attrs;
    assert_eq!(attrs.width(), Some(&Dimension::Px(350)));
    assert_eq!(attrs.src(), Some("a.png"));
    assert_eq!(attrs.title(), Some("A title"));
    let style = figure_view_core::InlineStyle::parse(attrs.style().unwrap());
    assert_eq!(Alignment::detect(&style), Some(Alignment::Right));
    assert_eq!(editor.host.transactions(), 2);
    assert_eq!(editor.recreated, 0);
}

#[test]
fn markdown_input_then_serialize() {
    let mut editor = Editor::new(vec![Block::Paragraph("".into())]);
    let found = apply_input_rule(editor.host.as_ref(), 1, r#"![caption](http://x/img.png "t")"#)
        .unwrap()
        .unwrap();
    assert_eq!(found.alt, "caption");
    editor.render();

    let node = editor.host.node_at(1).unwrap();
    insta::assert_snapshot!(
        render_html(&node, &FigureOptions::default()),
        @r#"<img src="http://x/img.png" alt="caption" title="t">"#
    );
    let dom = editor.ctx.dom.clone();
    let view = editor.view(1);
    assert_eq!(
        dom.get_attribute(view.image(), "src").as_deref(),
        Some("http://x/img.png")
    );
}

#[test]
fn delete_control_removes_node() {
    let mut editor = Editor::new(vec![
        Block::Image(ImageNode::image(image_attrs("a.png"))),
        Block::Paragraph("after".into()),
    ]);
    editor.click_image(0);
    let outcome = editor.click_control(0, ControlKind::Delete);
    assert_eq!(outcome, IntentOutcome::Deleted);
    assert_eq!(editor.host.blocks(), vec![Block::Paragraph("after".into())]);
}
