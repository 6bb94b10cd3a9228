//! JavaScript stealth injection
//!
//! Patches the automation tells Google checks before any navigation
//! happens: the webdriver flag, navigator surfaces, the chrome runtime
//! object, and the WebGL vendor strings.

use anyhow::Result;
use chromiumoxide::page::Page;
use tracing::info;

use super::browser::CHROME_USER_AGENT;

/// Apply stealth measures to a blank page, before navigation
pub async fn apply_stealth_measures(page: &Page) -> Result<()> {
    info!("Applying stealth measures to page");

    let webdriver_js = r"
        Object.defineProperty(navigator, 'webdriver', {
            get: () => false
        });
    ";
    page.evaluate(webdriver_js).await?;

    let user_agent_js = format!(
        r"
        Object.defineProperty(navigator, 'userAgent', {{
            value: '{CHROME_USER_AGENT}'
        }});
    "
    );
    page.evaluate(user_agent_js.as_str()).await?;

    let languages_js = r"
        Object.defineProperty(navigator, 'languages', {
            get: () => ['en-US', 'en']
        });
    ";
    page.evaluate(languages_js).await?;

    let chrome_runtime_js = r"
        if (!window.chrome) {
            window.chrome = {};
        }
        if (!window.chrome.runtime) {
            window.chrome.runtime = {
                connect: () => ({
                    onMessage: { addListener: () => {}, removeListener: () => {} },
                    postMessage: () => {}
                })
            };
        }
    ";
    page.evaluate(chrome_runtime_js).await?;

    let webgl_js = r"
        const getParameterProxyHandler = {
            apply: function(target, ctx, args) {
                const param = (args && args[0]) || null;

                // UNMASKED_VENDOR_WEBGL
                if (param === 37445) {
                    return 'Intel Inc.';
                }
                // UNMASKED_RENDERER_WEBGL
                if (param === 37446) {
                    return 'Intel Iris OpenGL Engine';
                }

                return Reflect.apply(target, ctx, args);
            }
        };

        if (window.WebGLRenderingContext) {
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, getParameterProxyHandler);
        }
    ";
    page.evaluate(webgl_js).await?;

    info!("Successfully applied stealth measures");
    Ok(())
}
