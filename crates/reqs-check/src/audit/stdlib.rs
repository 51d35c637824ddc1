//! Standard-library modules and well-known import aliases

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Top-level standard-library modules of CPython 3.8 through 3.12, sorted
const STDLIB_MODULES: &[&str] = &[
    "__future__", "_thread", "abc", "aifc", "argparse", "array", "ast", "asynchat",
    "asyncio", "asyncore", "atexit", "audioop", "base64", "bdb", "binascii", "bisect",
    "builtins", "bz2", "cProfile", "calendar", "cgi", "cgitb", "chunk", "cmath", "cmd",
    "code", "codecs", "codeop", "collections", "colorsys", "compileall", "concurrent",
    "configparser", "contextlib", "contextvars", "copy", "copyreg", "crypt", "csv",
    "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis",
    "distutils", "doctest", "email", "encodings", "ensurepip", "enum", "errno",
    "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib",
    "functools", "gc", "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip",
    "hashlib", "heapq", "hmac", "html", "http", "imaplib", "imghdr", "imp", "importlib",
    "inspect", "io", "ipaddress", "itertools", "json", "keyword", "lib2to3", "linecache",
    "locale", "logging", "lzma", "mailbox", "mailcap", "marshal", "math", "mimetypes",
    "mmap", "modulefinder", "msvcrt", "multiprocessing", "netrc", "nis", "nntplib",
    "numbers", "operator", "optparse", "os", "ossaudiodev", "pathlib", "pdb", "pickle",
    "pickletools", "pipes", "pkgutil", "platform", "plistlib", "poplib", "posix",
    "pprint", "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc",
    "queue", "quopri", "random", "re", "readline", "reprlib", "resource", "rlcompleter",
    "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex", "shutil",
    "signal", "site", "smtpd", "smtplib", "sndhdr", "socket", "socketserver", "spwd",
    "sqlite3", "ssl", "stat", "statistics", "string", "stringprep", "struct",
    "subprocess", "sunau", "symtable", "sys", "sysconfig", "syslog", "tabnanny",
    "tarfile", "telnetlib", "tempfile", "termios", "textwrap", "threading", "time",
    "timeit", "tkinter", "token", "tokenize", "tomllib", "trace", "traceback",
    "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata", "unittest",
    "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser",
    "winreg", "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile",
    "zipimport", "zlib", "zoneinfo",
];

/// Import names whose distribution is published under another name
pub static DEFAULT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Crypto", "pycryptodome"),
        ("OpenSSL", "pyopenssl"),
        ("PIL", "pillow"),
        ("_pytest", "pytest"),
        ("attr", "attrs"),
        ("boa", "titanoboa"),
        ("bs4", "beautifulsoup4"),
        ("cv2", "opencv-python"),
        ("dateutil", "python-dateutil"),
        ("dotenv", "python-dotenv"),
        ("git", "gitpython"),
        ("jwt", "pyjwt"),
        ("pkg_resources", "setuptools"),
        ("serial", "pyserial"),
        ("sklearn", "scikit-learn"),
        ("yaml", "pyyaml"),
    ])
});

/// Check whether a top-level module ships with Python
pub fn is_stdlib(module: &str) -> bool {
    STDLIB_MODULES.binary_search(&module).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_list_is_sorted() {
        assert!(STDLIB_MODULES.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_stdlib_lookup() {
        for module in ["sys", "time", "math", "decimal", "dataclasses", "typing", "__future__"] {
            assert!(is_stdlib(module), "{}", module);
        }
        for module in ["boa", "hypothesis", "yaml", "eth_utils", "rich"] {
            assert!(!is_stdlib(module), "{}", module);
        }
    }

    #[test]
    fn test_default_aliases() {
        assert_eq!(DEFAULT_ALIASES.get("yaml"), Some(&"pyyaml"));
        assert_eq!(DEFAULT_ALIASES.get("boa"), Some(&"titanoboa"));
        assert_eq!(DEFAULT_ALIASES.get("hypothesis"), None);
    }
}
