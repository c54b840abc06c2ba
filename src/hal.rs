/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/hal.rs

    The capabilities the drive core requires from the hardware: a source of flux intervals,
    the drive control and sense lines, and a time base.
*/

use std::{
    fmt::{self, Display, Formatter},
    time::{Duration, Instant},
};

/// A source of flux transition timings from the drive's read-data line.
pub trait FluxSource {
    /// Return the time in seconds since the previous flux transition, waiting at most `timeout`
    /// for the next one. Returns `None` if no transition occurred in time.
    fn next_interval(&mut self, timeout: Duration) -> Option<f64>;
}

/// A monotonic time base with blocking delays.
pub trait Clock {
    /// The time elapsed since an arbitrary fixed epoch.
    fn now(&self) -> Duration;
    /// Block for at least `duration`.
    fn delay(&mut self, duration: Duration);
}

/// The drive control outputs. Writing `true` asserts a line in its logically active sense;
/// electrical polarity is the implementor's concern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum OutputLine {
    Select,
    Motor,
    /// Asserted steps the head inward, toward higher cylinders.
    Direction,
    Step,
    /// Asserted selects head 1.
    Side,
}

/// The drive sense inputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum InputLine {
    Track0,
    Index,
    WriteProtect,
}

impl Display for OutputLine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            OutputLine::Select => write!(f, "SELECT"),
            OutputLine::Motor => write!(f, "MOTOR"),
            OutputLine::Direction => write!(f, "DIR"),
            OutputLine::Step => write!(f, "STEP"),
            OutputLine::Side => write!(f, "SIDE"),
        }
    }
}

impl Display for InputLine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            InputLine::Track0 => write!(f, "TRK00"),
            InputLine::Index => write!(f, "INDEX"),
            InputLine::WriteProtect => write!(f, "WPT"),
        }
    }
}

/// Access to the discrete drive control and sense lines.
pub trait DriveLines {
    fn write(&mut self, line: OutputLine, asserted: bool);
    fn read(&mut self, line: InputLine) -> bool;
}

/// A [Clock] over the host's monotonic clock and thread sleep.
pub struct StdClock {
    epoch: Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        StdClock { epoch: Instant::now() }
    }
}

impl StdClock {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: FluxSource + ?Sized> FluxSource for Box<T> {
    fn next_interval(&mut self, timeout: Duration) -> Option<f64> {
        (**self).next_interval(timeout)
    }
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

impl<T: DriveLines + ?Sized> DriveLines for Box<T> {
    fn write(&mut self, line: OutputLine, asserted: bool) {
        (**self).write(line, asserted)
    }

    fn read(&mut self, line: InputLine) -> bool {
        (**self).read(line)
    }
}
