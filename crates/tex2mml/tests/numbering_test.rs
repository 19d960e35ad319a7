use tex2mml::{Config, Converter, Kind, MathDisplay, Node, TagFormat, TagMode, TagSide};

fn converter(config: Config) -> Converter {
    Converter::new(config).unwrap()
}

fn ams() -> Converter {
    converter(Config {
        tags: TagMode::Ams,
        ..Default::default()
    })
}

/// The label cells of all numbered rows, in order.
fn tags(node: &Node) -> Vec<String> {
    let mut found = Vec::new();
    collect_tags(node, &mut found);
    found
}

fn collect_tags(node: &Node, found: &mut Vec<String>) {
    if node.is(Kind::Mlabeledtr) {
        if let Some(label) = node.child(0) {
            found.push(label.text_content());
        }
    }
    for child in node.children.iter().flatten() {
        collect_tags(child, found);
    }
}

fn find_link(node: &Node) -> Option<&Node> {
    if node.attributes.get("href").is_some() {
        return Some(node);
    }
    node.children.iter().flatten().find_map(find_link)
}

#[test]
fn equations_are_numbered_in_order() {
    let mut converter = converter(Config {
        tags: TagMode::Ams,
        start_number: 4,
        ..Default::default()
    });
    let mut all = Vec::new();
    for _ in 0..3 {
        let root = converter
            .try_translate(r"\begin{equation}x\end{equation}", MathDisplay::Block)
            .unwrap();
        all.extend(tags(&root));
    }
    assert_eq!(all, ["(5)", "(6)", "(7)"]);

    converter.reset_equation_numbers();
    let root = converter
        .try_translate(r"\begin{equation}x\end{equation}", MathDisplay::Block)
        .unwrap();
    assert_eq!(tags(&root), ["(5)"]);
}

#[test]
fn starred_and_notag() {
    let mut converter = ams();
    let root = converter
        .try_translate(
            r"\begin{align}a\\b\notag\\c\end{align}\begin{equation*}d\end{equation*}",
            MathDisplay::Block,
        )
        .unwrap();
    assert_eq!(tags(&root), ["(1)", "(2)"]);
}

#[test]
fn explicit_tags() {
    let mut converter = converter(Config::default());
    let root = converter
        .try_translate(r"E=mc^2 \tag{Einstein}", MathDisplay::Block)
        .unwrap();
    let table = root.child(0).unwrap();
    assert_eq!(table.kind, Kind::Mtable);
    assert_eq!(table.attributes.get("side"), Some("right"));
    assert_eq!(table.attributes.get("minlabelspacing"), Some("0.8em"));
    assert_eq!(tags(&root), ["(Einstein)"]);

    let root = converter
        .try_translate(r"x \tag*{A.1}", MathDisplay::Block)
        .unwrap();
    assert_eq!(tags(&root), ["A.1"]);

    // Inline formulas never carry tags.
    let root = converter
        .try_translate(r"x \tag{1}", MathDisplay::Inline)
        .unwrap();
    assert!(tags(&root).is_empty());
}

#[test]
fn all_mode_numbers_every_display() {
    let mut converter = converter(Config {
        tags: TagMode::All,
        ..Default::default()
    });
    let first = converter.try_translate("x", MathDisplay::Block).unwrap();
    let inline = converter.try_translate("y", MathDisplay::Inline).unwrap();
    let second = converter.try_translate("z", MathDisplay::Block).unwrap();
    assert_eq!(tags(&first), ["(1)"]);
    assert!(tags(&inline).is_empty());
    assert_eq!(tags(&second), ["(2)"]);
}

#[test]
fn labels_and_references() {
    let mut converter = ams();
    let root = converter
        .try_translate(
            r"\begin{equation}x\label{first}\end{equation}",
            MathDisplay::Block,
        )
        .unwrap();
    let label = root.child(0).unwrap().child(0).unwrap().child(0).unwrap();
    assert_eq!(label.attributes.get("id"), Some("eqn:first"));

    let root = converter
        .try_translate(r"\eqref{first}", MathDisplay::Inline)
        .unwrap();
    let link = find_link(&root).unwrap();
    assert_eq!(link.attributes.get("href"), Some("#eqn%3Afirst"));
    assert_eq!(link.text_content(), "(1)");
    assert_eq!(converter.pending_count(), 0);
}

#[test]
fn labels_point_to_the_tag_of_their_row() {
    let mut converter = ams();
    converter
        .try_translate(
            r"\begin{align}a\\b\label{two}\\c\label{three}\end{align}",
            MathDisplay::Block,
        )
        .unwrap();
    let root = converter
        .try_translate(r"\ref{two},\ref{three}", MathDisplay::Inline)
        .unwrap();
    assert_eq!(root.text_content(), "2,3");
}

#[test]
fn forward_references_are_rerun() {
    let mut converter = ams();
    let early = converter.translate(r"\ref{later}", MathDisplay::Inline);
    assert_eq!(early.root.text_content(), "???");
    assert_eq!(early.index, 0);
    assert_eq!(converter.pending_count(), 1);

    converter
        .try_translate(
            r"\begin{equation}y\label{later}\end{equation}",
            MathDisplay::Block,
        )
        .unwrap();

    let rerun = converter.rerun_pending();
    assert_eq!(rerun.len(), 1);
    assert_eq!(rerun[0].index, 0);
    assert_eq!(rerun[0].root.text_content(), "1");
    assert_eq!(converter.pending_count(), 0);

    // Rerunning doesn't advance the numbering.
    let root = converter
        .try_translate(r"\begin{equation}z\end{equation}", MathDisplay::Block)
        .unwrap();
    assert_eq!(tags(&root), ["(2)"]);
}

#[test]
fn rerun_keeps_its_own_numbers() {
    let mut converter = ams();
    let first = converter.translate(
        r"\begin{equation}x=\ref{b}\label{a}\end{equation}",
        MathDisplay::Block,
    );
    assert!(first.error.is_none());
    converter
        .try_translate(
            r"\begin{equation}y\label{b}\end{equation}",
            MathDisplay::Block,
        )
        .unwrap();
    let rerun = converter.rerun_pending();
    assert_eq!(tags(&rerun[0].root), ["(1)"]);
    assert_eq!(
        find_link(&rerun[0].root).map(Node::text_content).as_deref(),
        Some("2")
    );
}

#[test]
fn duplicate_labels() {
    let mut converter = ams();
    converter
        .try_translate(r"\begin{equation}x\label{a}\end{equation}", MathDisplay::Block)
        .unwrap();
    let error = converter
        .try_translate(r"\begin{equation}y\label{a}\end{equation}", MathDisplay::Block)
        .unwrap_err();
    assert_eq!(error.id(), "MultipleLabel");
}

#[test]
fn left_tags() {
    let mut converter = converter(Config {
        tags: TagMode::Ams,
        tag_side: TagSide::Left,
        tag_indent: "2em".to_string(),
        ..Default::default()
    });
    let root = converter
        .try_translate(r"\begin{align}a&=b\end{align}", MathDisplay::Block)
        .unwrap();
    let table = root.child(0).unwrap();
    assert_eq!(table.attributes.get("side"), Some("left"));
    assert_eq!(table.attributes.get("minlabelspacing"), Some("2em"));
}

#[derive(Debug)]
struct Bracketed;

impl TagFormat for Bracketed {
    fn format_tag(&self, tag: &str) -> String {
        format!("[{tag}]")
    }

    fn format_id(&self, id: &str) -> String {
        format!("eq-{id}")
    }
}

#[test]
fn custom_tag_format() {
    let mut converter = converter(Config {
        tags: TagMode::Ams,
        tag_format: Box::new(Bracketed),
        use_label_ids: false,
        base_url: "page.html".to_string(),
        ..Default::default()
    });
    let root = converter
        .try_translate(
            r"\begin{equation}x\label{k}\end{equation}",
            MathDisplay::Block,
        )
        .unwrap();
    let label = root.child(0).unwrap().child(0).unwrap().child(0).unwrap();
    assert_eq!(label.attributes.get("id"), Some("eq-1"));
    assert_eq!(label.text_content(), "[1]");

    let root = converter
        .try_translate(r"\eqref{k}", MathDisplay::Inline)
        .unwrap();
    let link = find_link(&root).unwrap();
    assert_eq!(link.attributes.get("href"), Some("page.html#eq-1"));
    assert_eq!(link.text_content(), "[1]");
}
