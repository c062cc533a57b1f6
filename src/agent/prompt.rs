use crate::repo::RemoteFile;

/// Capabilities and rules the model works under, ahead of the site files
const INSTRUCTIONS: &str = r#"You are an expert web developer working as an autonomous agent with read and write access to the GitHub repository that hosts this static website. Change the website so that it fulfils the user's request.

WHAT YOU CAN DO:

1. Data-driven features with a JSON database:
   - Keep structured data (products, posts, projects, guestbook entries) as an array of objects in a `database.json` file at the repository root.
   - Load it from the page script with `fetch('./database.json')`, build the HTML elements from the records and insert them into the page.
   - Example: "Add a portfolio with 3 projects" means creating `database.json` with the projects and updating `script.js` and `index.html` to render them.

2. Images:
   - Use the placeholder service https://picsum.photos/ whenever images are needed.
   - Give every image a distinct query, e.g. `https://picsum.photos/800/600?random=1`, `?random=2`, so each one is unique.

RULES (check your answer against every one before replying):

1. Relative paths only: every `href`, `src` and `fetch` target must be relative, e.g. `./style.css` or `./database.json`.
2. Linked pages: when you add a page such as `about.html`, add a link to it in the navigation of every existing HTML page.
3. Working data binding: script code must wait for `DOMContentLoaded` before touching the DOM, then fetch the data, iterate over it and render it.
4. Complete code: no placeholders such as "// your code here".
5. Changed files only: return only files that are new or modified. Leave unchanged files out of the answer.
"#;

/// Label every file so the model can tell where one ends and the next begins
pub fn format_corpus(files: &[RemoteFile]) -> String {
    files
        .iter()
        .map(|f| format!("\n--- File: {} ---\n{}\n", f.path, f.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assemble the full prompt: instructions, the current site, then the request verbatim
pub fn build_prompt(files: &[RemoteFile], request: &str) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\nEXISTING WEBSITE FILES:\n");
    prompt.push_str(&format_corpus(files));
    prompt.push_str("\n\nUSER REQUEST:\n\"");
    prompt.push_str(request);
    prompt.push_str("\"\n\nReply with the files to create or update for this request.\n");
    prompt
}
