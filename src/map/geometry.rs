use glam::DVec2;

/// Walk a line using Bresenham's algorithm, calling `plot` for every pixel
pub fn draw_line<F>(x0: i32, y0: i32, x1: i32, y1: i32, plot: &mut F)
where
    F: FnMut(i32, i32),
{
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        plot(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Stroke a closed ring
pub fn draw_ring<F>(ring: &[DVec2], plot: &mut F)
where
    F: FnMut(i32, i32),
{
    if ring.is_empty() {
        return;
    }
    let to_px = |p: DVec2| (p.x.floor() as i32, p.y.floor() as i32);
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let (x0, y0) = to_px(a);
        let (x1, y1) = to_px(b);
        draw_line(x0, y0, x1, y1, plot);
    }
}

/// Even-odd scanline fill sampling pixel centers, clipped to `width` x `height`
pub fn fill_ring<F>(ring: &[DVec2], width: usize, height: usize, plot: &mut F)
where
    F: FnMut(usize, usize),
{
    if ring.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let (min_y, max_y) = ring
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let row_start = (min_y - 0.5).ceil().max(0.0) as usize;
    let row_end = ((max_y - 0.5).floor()).min(height as f64 - 1.0);
    if row_end < 0.0 {
        return;
    }

    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for row in row_start..=row_end as usize {
        let yc = row as f64 + 0.5;
        crossings.clear();

        for (i, &a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            if (a.y <= yc) != (b.y <= yc) {
                crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = (span[1] - 0.5).floor().min(width as f64 - 1.0);
            if end < start {
                continue;
            }
            for col in start as usize..=end as usize {
                plot(col, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut pixels = Vec::new();
        draw_line(0, 0, 4, 0, &mut |x, y| pixels.push((x, y)));
        assert_eq!(pixels, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn test_vertical_line() {
        let mut pixels = Vec::new();
        draw_line(0, 0, 0, 7, &mut |x, y| pixels.push((x, y)));
        assert_eq!(pixels.len(), 8);
        assert_eq!(pixels.last(), Some(&(0, 7)));
    }

    #[test]
    fn test_fill_square() {
        let ring = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(5.0, 1.0),
            DVec2::new(5.0, 5.0),
            DVec2::new(1.0, 5.0),
        ];
        let mut count = 0;
        let mut inside = true;
        fill_ring(&ring, 10, 10, &mut |x, y| {
            count += 1;
            inside &= (1..5).contains(&x) && (1..5).contains(&y);
        });
        assert_eq!(count, 16);
        assert!(inside);
    }

    #[test]
    fn test_fill_is_clipped() {
        let ring = vec![
            DVec2::new(-5.0, -5.0),
            DVec2::new(50.0, -5.0),
            DVec2::new(50.0, 50.0),
            DVec2::new(-5.0, 50.0),
        ];
        let mut count = 0;
        fill_ring(&ring, 4, 3, &mut |x, y| {
            assert!(x < 4 && y < 3);
            count += 1;
        });
        assert_eq!(count, 12);
    }

    #[test]
    fn test_ring_closes() {
        let ring = vec![DVec2::new(0.5, 0.5), DVec2::new(3.5, 0.5), DVec2::new(0.5, 3.5)];
        let mut pixels = Vec::new();
        draw_ring(&ring, &mut |x, y| pixels.push((x, y)));
        assert!(pixels.contains(&(0, 2)));
        assert!(pixels.contains(&(2, 1)));
    }
}
