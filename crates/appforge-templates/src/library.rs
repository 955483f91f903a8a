//! Deterministic single-file HTML applications, one per [`Category`].
//!
//! Every template is assembled from fixed fragments plus the HTML-escaped
//! prompt, so user text can never terminate the document early.

use appforge_core::Artifact;
use appforge_core::validator::trusted;

use crate::classifier::Category;

const BASE_STYLE: &str = "\
*{box-sizing:border-box}\
body{margin:0;min-height:100vh;display:flex;flex-direction:column;align-items:center;justify-content:center;\
font-family:system-ui,-apple-system,Segoe UI,Roboto,sans-serif;background:#0f172a;color:#e2e8f0}\
main{background:#1e293b;padding:2rem;border-radius:1rem;box-shadow:0 10px 30px rgba(0,0,0,.4);min-width:320px}\
h1{margin-top:0;font-size:1.4rem}\
button{cursor:pointer;border:0;border-radius:.5rem;padding:.8rem;font-size:1.1rem;background:#334155;color:#e2e8f0}\
button:hover{background:#475569}\
footer{margin-top:1rem;font-size:.75rem;color:#64748b}";

/// Render the template for `category`, labelled with `prompt`.
pub fn render(category: Category, prompt: &str) -> Artifact {
    let label = escape_html(prompt.trim());
    let (title, style, body, script) = match category {
        Category::Calculator => ("Calculator", CALCULATOR_STYLE, CALCULATOR_BODY.to_string(), CALCULATOR_SCRIPT),
        Category::TodoList => ("Todo List", TODO_STYLE, TODO_BODY.to_string(), TODO_SCRIPT),
        Category::Timer => ("Timer", TIMER_STYLE, TIMER_BODY.to_string(), TIMER_SCRIPT),
        Category::Counter => ("Counter", COUNTER_STYLE, COUNTER_BODY.to_string(), COUNTER_SCRIPT),
        Category::LandingPage => ("Welcome", LANDING_STYLE, landing_body(&label), ""),
        Category::Generic => ("Generated App", GENERIC_STYLE, generic_body(&label), ""),
    };
    trusted(page(title, &label, style, &body, script))
}

fn page(title: &str, label: &str, style: &str, body: &str, script: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n\
<style>{BASE_STYLE}{style}</style>\n\
</head>\n\
<body>\n\
<main>\n\
{body}\n\
</main>\n\
<footer>Generated from: {label}</footer>\n\
<script>{script}</script>\n\
</body>\n\
</html>"
    )
}

/// Escape text for safe embedding in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Calculator ──────────────────────────────────────────────────

const CALCULATOR_STYLE: &str = "\
#display{width:100%;font-size:2rem;text-align:right;padding:.6rem;margin-bottom:1rem;border-radius:.5rem;border:0;background:#0f172a;color:#f8fafc}\
.keys{display:grid;grid-template-columns:repeat(4,1fr);gap:.5rem}\
.op{background:#0369a1}.eq{background:#15803d}.clear{background:#b91c1c}";

const CALCULATOR_BODY: &str = r#"<h1>Calculator</h1>
<input id="display" value="0" readonly>
<div class="keys">
<button class="clear" data-action="clear">C</button>
<button class="op" data-op="/">&divide;</button>
<button class="op" data-op="*">&times;</button>
<button class="op" data-op="-">&minus;</button>
<button data-digit="7">7</button>
<button data-digit="8">8</button>
<button data-digit="9">9</button>
<button class="op" data-op="+">+</button>
<button data-digit="4">4</button>
<button data-digit="5">5</button>
<button data-digit="6">6</button>
<button data-digit=".">.</button>
<button data-digit="1">1</button>
<button data-digit="2">2</button>
<button data-digit="3">3</button>
<button class="eq" data-action="equals">=</button>
<button data-digit="0">0</button>
</div>"#;

const CALCULATOR_SCRIPT: &str = r#"
const display = document.getElementById('display');
let current = '0', stored = null, pending = null;
const show = () => { display.value = current; };
const apply = (a, b, op) => op === '+' ? a + b : op === '-' ? a - b : op === '*' ? a * b : b === 0 ? NaN : a / b;
document.querySelectorAll('button').forEach(btn => btn.addEventListener('click', () => {
  const d = btn.dataset;
  if (d.digit !== undefined) {
    if (d.digit === '.' && current.includes('.')) return;
    current = current === '0' && d.digit !== '.' ? d.digit : current + d.digit;
  } else if (d.op) {
    if (pending !== null) { current = String(apply(stored, parseFloat(current), pending)); }
    stored = parseFloat(current); pending = d.op; show(); current = '0'; return;
  } else if (d.action === 'equals' && pending !== null) {
    current = String(apply(stored, parseFloat(current), pending)); stored = null; pending = null;
  } else if (d.action === 'clear') {
    current = '0'; stored = null; pending = null;
  }
  show();
}));
"#;

// ── Todo list ───────────────────────────────────────────────────

const TODO_STYLE: &str = "\
form{display:flex;gap:.5rem}\
input{flex:1;padding:.7rem;border-radius:.5rem;border:0;background:#0f172a;color:#f8fafc}\
ul{list-style:none;padding:0}\
li{display:flex;justify-content:space-between;align-items:center;padding:.5rem 0;border-bottom:1px solid #334155}\
li.done span{text-decoration:line-through;color:#64748b}";

const TODO_BODY: &str = r#"<h1>Todo List</h1>
<form id="add-form">
<input id="new-item" placeholder="What needs doing?" autocomplete="off">
<button type="submit">Add</button>
</form>
<ul id="items"></ul>
<p id="remaining"></p>"#;

const TODO_SCRIPT: &str = r#"
const KEY = 'appforge-todos';
let items = JSON.parse(localStorage.getItem(KEY) || '[]');
const list = document.getElementById('items');
const save = () => localStorage.setItem(KEY, JSON.stringify(items));
function draw() {
  list.innerHTML = '';
  items.forEach((item, i) => {
    const li = document.createElement('li');
    if (item.done) li.className = 'done';
    const text = document.createElement('span');
    text.textContent = item.text;
    text.addEventListener('click', () => { items[i].done = !items[i].done; save(); draw(); });
    const del = document.createElement('button');
    del.textContent = 'Delete';
    del.addEventListener('click', () => { items.splice(i, 1); save(); draw(); });
    li.append(text, del);
    list.append(li);
  });
  document.getElementById('remaining').textContent = items.filter(i => !i.done).length + ' remaining';
}
document.getElementById('add-form').addEventListener('submit', e => {
  e.preventDefault();
  const input = document.getElementById('new-item');
  const text = input.value.trim();
  if (!text) return;
  items.push({ text, done: false });
  input.value = '';
  save(); draw();
});
draw();
"#;

// ── Timer ───────────────────────────────────────────────────────

const TIMER_STYLE: &str = "\
#clock{font-size:3.5rem;font-variant-numeric:tabular-nums;text-align:center;margin:1rem 0}\
.controls{display:flex;gap:.5rem;justify-content:center}";

const TIMER_BODY: &str = r#"<h1>Timer</h1>
<div id="clock">00:00.0</div>
<div class="controls">
<button id="start">Start</button>
<button id="stop">Stop</button>
<button id="reset">Reset</button>
</div>"#;

const TIMER_SCRIPT: &str = r#"
const clock = document.getElementById('clock');
let elapsed = 0, started = null, handle = null;
const pad = n => String(n).padStart(2, '0');
function draw() {
  const total = elapsed + (started ? Date.now() - started : 0);
  const tenths = Math.floor(total / 100) % 10;
  const secs = Math.floor(total / 1000) % 60;
  const mins = Math.floor(total / 60000);
  clock.textContent = pad(mins) + ':' + pad(secs) + '.' + tenths;
}
document.getElementById('start').addEventListener('click', () => {
  if (started) return;
  started = Date.now();
  handle = setInterval(draw, 100);
});
document.getElementById('stop').addEventListener('click', () => {
  if (!started) return;
  elapsed += Date.now() - started; started = null;
  clearInterval(handle); draw();
});
document.getElementById('reset').addEventListener('click', () => {
  elapsed = 0; started = started ? Date.now() : null; draw();
});
"#;

// ── Counter ─────────────────────────────────────────────────────

const COUNTER_STYLE: &str = "\
#count{font-size:4rem;text-align:center;margin:1rem 0}\
.controls{display:flex;gap:.5rem;justify-content:center}";

const COUNTER_BODY: &str = r#"<h1>Counter</h1>
<div id="count">0</div>
<div class="controls">
<button id="dec">&minus;1</button>
<button id="reset">Reset</button>
<button id="inc">+1</button>
</div>"#;

const COUNTER_SCRIPT: &str = r#"
let count = 0;
const out = document.getElementById('count');
const draw = () => { out.textContent = count; };
document.getElementById('inc').addEventListener('click', () => { count++; draw(); });
document.getElementById('dec').addEventListener('click', () => { count--; draw(); });
document.getElementById('reset').addEventListener('click', () => { count = 0; draw(); });
"#;

// ── Landing page ────────────────────────────────────────────────

const LANDING_STYLE: &str = "\
main{max-width:720px;text-align:center}\
.hero{font-size:2rem;margin:.5rem 0 1rem}\
.features{display:grid;grid-template-columns:repeat(auto-fit,minmax(180px,1fr));gap:1rem;margin-top:1.5rem;text-align:left}\
.features div{background:#0f172a;padding:1rem;border-radius:.5rem}";

fn landing_body(label: &str) -> String {
    format!(
        "<h1 class=\"hero\">{label}</h1>\n\
<p>Built to get you from idea to launch in minutes.</p>\n\
<button onclick=\"document.getElementById('features').scrollIntoView()\">Get started</button>\n\
<section id=\"features\" class=\"features\">\n\
<div><h3>Fast</h3><p>A single page with no build step.</p></div>\n\
<div><h3>Simple</h3><p>Edit the text and ship.</p></div>\n\
<div><h3>Yours</h3><p>Plain HTML and CSS, no lock-in.</p></div>\n\
</section>"
    )
}

// ── Generic ─────────────────────────────────────────────────────

const GENERIC_STYLE: &str = "main{max-width:640px}.prompt{font-size:1.2rem;white-space:pre-wrap}";

fn generic_body(label: &str) -> String {
    format!(
        "<h1>Your app</h1>\n\
<p class=\"prompt\">{label}</p>\n\
<p>This starter page was generated locally. Edit it to bring your idea to life.</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::validate;

    const ALL: [Category; 6] = [
        Category::Calculator,
        Category::TodoList,
        Category::Timer,
        Category::Counter,
        Category::LandingPage,
        Category::Generic,
    ];

    #[test]
    fn every_category_renders_a_valid_document() {
        for category in ALL {
            let artifact = render(category, "anything");
            let text = artifact.as_str();
            assert!(text.starts_with("<!DOCTYPE html>"), "{category}");
            assert!(text.ends_with("</html>"), "{category}");
            assert_eq!(validate(text).unwrap(), artifact, "{category}");
        }
    }

    #[test]
    fn render_is_deterministic() {
        for category in ALL {
            assert_eq!(render(category, "same"), render(category, "same"));
        }
    }

    #[test]
    fn calculator_has_digits_and_controls() {
        let text = render(Category::Calculator, "build me a calculator").into_string();
        for digit in 0..=9 {
            assert!(text.contains(&format!("data-digit=\"{digit}\">{digit}</button>")), "digit {digit}");
        }
        assert!(text.contains(">=</button>"));
        assert!(text.contains(">C</button>"));
    }

    #[test]
    fn generic_embeds_prompt_as_visible_label() {
        let text = render(Category::Generic, "a weather dashboard for Oslo").into_string();
        assert!(text.contains("<p class=\"prompt\">a weather dashboard for Oslo</p>"));
    }

    #[test]
    fn prompt_is_escaped() {
        let text = render(Category::Generic, "</html><script>x</script>").into_string();
        assert!(text.contains("&lt;/html&gt;&lt;script&gt;x&lt;/script&gt;"));
        assert_eq!(text.matches("</html>").count(), 1);
    }

    #[test]
    fn escape_html_handles_all_specials() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
