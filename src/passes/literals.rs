use crate::export::ExportContext;

/// Replaces every connection from a literal placeholder with the placeholder's static value.
///
/// Sockets fed by a placeholder without a value are left disconnected. The placeholder table
/// is consumed, so no placeholder index survives in the graph. Returns the number of
/// sockets rewritten.
pub fn resolve_literals(ctx: &mut ExportContext) -> usize {
    let placeholders = ctx.take_placeholders();
    let mut rewritten = 0;
    let mut unresolved = 0;

    for node in &mut ctx.graph_mut().nodes {
        for (name, input) in node.values_in.iter_mut() {
            let Some(source) = input.source.as_ref() else {
                continue;
            };
            if !source.node.is_placeholder() {
                continue;
            }
            match placeholders.get(&source.node) {
                Some(Some(value)) => {
                    input.literal = Some(value.clone());
                }
                Some(None) => unresolved += 1,
                None => {
                    tracing::warn!(node = %node.index, socket = %name, "connection to an unknown placeholder");
                    unresolved += 1;
                }
            }
            input.source = None;
            rewritten += 1;
        }
    }

    tracing::debug!(rewritten, unresolved, "literal placeholders resolved");
    rewritten
}
