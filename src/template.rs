//! Default project template
//!
//! The seed tree loaded whenever no local directory is connected and on
//! explicit reset: a Vite + React starter with a manifest, a config file,
//! a markup entry point, and a `src` subtree.

use crate::workspace::{FileRecord, TreeNode};

const VITE_CONFIG: &str = r#"import { defineConfig } from 'vite'
import react from '@vitejs/plugin-react'

// https://vitejs.dev/config/
export default defineConfig({
  plugins: [react()],
  server: {
    host: true,
    port: 3000,
    strictPort: true,
    hmr: {
      host: true,
      protocol: 'ws',
      clientPort: 3000
    }
  }
})"#;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <link rel="icon" type="image/svg+xml" href="/vite.svg" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Vite + React App</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.jsx"></script>
  </body>
</html>"#;

const MAIN_JSX: &str = r#"import React from 'react'
import ReactDOM from 'react-dom/client'
import App from './App.jsx'
import './index.css'

ReactDOM.createRoot(document.getElementById('root')).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>,
)"#;

const APP_JSX: &str = r#"import { useState } from 'react'
import './App.css'

function App() {
  const [count, setCount] = useState(0)

  return (
    <div className="App">
      <h1>Vite + React</h1>
      <div className="card">
        <button onClick={() => setCount((count) => count + 1)}>
          count is {count}
        </button>
        <p>
          Edit <code>src/App.jsx</code> and save to test HMR!
        </p>
      </div>
    </div>
  )
}

export default App"#;

const APP_CSS: &str = r#"body{
  justify-content: center;
  align-items: center;
}

.App {
  max-width: 1280px;
  margin: 0 auto;
  padding: 2rem;
  text-align: center;
}

.card {
  padding: 2em;
}

button {
  border-radius: 8px;
  border: 1px solid transparent;
  padding: 0.6em 1.2em;
  font-size: 1em;
  font-weight: 500;
  font-family: inherit;
  background-color: #1a1a1a;
  cursor: pointer;
  transition: border-color 0.25s;
  color: white;
}

button:hover {
  border-color: #646cff;
}"#;

const INDEX_CSS: &str = r#":root {
  font-family: Inter, system-ui, Avenir, Helvetica, Arial, sans-serif;
  line-height: 1.5;
  font-weight: 400;

  color-scheme: light dark;
  color: rgba(255, 255, 255, 0.87);
  background-color: #242424;
}

a {
  font-weight: 500;
  color: #646cff;
  text-decoration: inherit;
}
a:hover {
  color: #535bf2;
}

body {
  margin: 0;
  display: flex;
  place-items: center;
  min-width: 320px;
  min-height: 100vh;
}

h1 {
  font-size: 3.2em;
  line-height: 1.1;
}"#;

fn package_manifest() -> String {
    let manifest = serde_json::json!({
        "name": "vite-app",
        "private": true,
        "version": "0.0.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0"
        },
        "devDependencies": {
            "@types/react": "^18.2.43",
            "@types/react-dom": "^18.2.17",
            "@vitejs/plugin-react": "^4.2.1",
            "vite": "^5.0.8"
        }
    });
    serde_json::to_string_pretty(&manifest).unwrap_or_default()
}

/// Build the default project as record trees ready for
/// `PathTable::load_batch`. Top-level paths are absolute, like any other
/// ingestion batch.
pub fn default_project() -> Vec<TreeNode> {
    vec![
        TreeNode::leaf(FileRecord::file("/package.json", package_manifest())),
        TreeNode::leaf(FileRecord::file("/vite.config.js", VITE_CONFIG)),
        TreeNode::leaf(FileRecord::file("/index.html", INDEX_HTML)),
        TreeNode::branch(
            FileRecord::directory("/src"),
            vec![
                TreeNode::leaf(FileRecord::file("/src/main.jsx", MAIN_JSX)),
                TreeNode::leaf(FileRecord::file("/src/App.jsx", APP_JSX)),
                TreeNode::leaf(FileRecord::file("/src/App.css", APP_CSS)),
                TreeNode::leaf(FileRecord::file("/src/index.css", INDEX_CSS)),
            ],
        ),
    ]
}

/// Normalized paths of every template entry, for reset assertions.
pub fn template_paths() -> Vec<&'static str> {
    vec![
        "index.html",
        "package.json",
        "src",
        "src/App.css",
        "src/App.jsx",
        "src/index.css",
        "src/main.jsx",
        "vite.config.js",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::PathTable;

    #[test]
    fn test_template_loads_into_table() {
        let mut table = PathTable::new();
        table.load_batch(&default_project(), "");

        let stored: Vec<&str> = table.paths().collect();
        assert_eq!(stored, template_paths());
    }

    #[test]
    fn test_manifest_declares_dev_script() {
        let manifest = package_manifest();
        let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["scripts"]["dev"], "vite");
        assert_eq!(parsed["name"], "vite-app");
    }

    #[test]
    fn test_template_files_carry_language_tags() {
        let mut table = PathTable::new();
        table.load_batch(&default_project(), "");

        let app = table.get("src/App.jsx").unwrap();
        assert_eq!(app.language.as_deref(), Some("javascript"));
        let css = table.get("src/App.css").unwrap();
        assert_eq!(css.language.as_deref(), Some("css"));
    }
}
