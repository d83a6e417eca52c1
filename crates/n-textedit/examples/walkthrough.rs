//! n-textedit walkthrough: one refactoring expressed as a single edit tree.
//!
//! The tree renames a function and moves it into its caller as a local
//! function, re-indented for its new depth. It is applied in one pass, the
//! resulting regions are printed, and the undo edit restores the original
//! text.
//!
//! ```text
//! cargo run -p n-textedit --example walkthrough [-- <style>]
//! ```
//!
//! `<style>` is an apply style such as `undo,regions` (the default) or
//! `none`. Set `RUST_LOG=n_textedit=trace` to watch the engine's phases.

use n_text::{Document, TextDocument};
use n_textedit::{ApplyStyle, EditGroup, EditTree, Reindent};

const SOURCE: &str = "\
fn helper() {
    work();
}
fn main() {
    helper();
}
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let style: ApplyStyle = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => ApplyStyle::default(),
    };

    let mut doc = TextDocument::from_text(SOURCE);
    let mut tree = EditTree::new();
    let root = tree.multi(0, doc.len());
    let mut rename = EditGroup::new("rename helper -> assist");

    // `fn helper() {\n    work();\n}\n` occupies the first 28 chars.
    let helper = tree.move_source(0, 28);
    let def_name = tree.replace(3, 6, "assist");
    tree.add_child(helper, def_name)?;
    rename.add(def_name);

    // `    helper();\n` inside main. The helper lands right before the call.
    let main_body = tree.range_marker(40, 14);
    let local_fn = tree.move_target(44);
    let call_name = tree.replace(44, 6, "assist");
    tree.add_children(main_body, &[local_fn, call_name])?;
    rename.add(call_name);

    tree.add_children(root, &[helper, main_body])?;
    tree.set_target_edit(helper, local_fn)?;
    tree.set_modifier(helper, Box::new(Reindent::new(0, "    ")))?;

    println!("-- tree --------------------------------------------------");
    println!("{}", tree.display(root));

    let undo = tree.apply(root, &mut doc, style)?;

    println!("-- after -------------------------------------------------");
    print!("{}", doc.text());
    println!("-- regions -----------------------------------------------");
    println!("{}", tree.display(root));
    match rename.region(&tree) {
        Some(region) => println!("{}: {region}", rename.name()),
        None => println!("{}: deleted", rename.name()),
    }

    if let Some(undo) = undo {
        tree.apply(undo, &mut doc, ApplyStyle::NONE)?;
        println!("-- undone ------------------------------------------------");
        print!("{}", doc.text());
        assert_eq!(doc.text(), SOURCE);
    }
    Ok(())
}
